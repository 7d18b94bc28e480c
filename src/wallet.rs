//! Wallet capability abstraction.
//!
//! Providers never inspect a wallet's concrete type at call sites. Instead,
//! a wallet enters the toolkit as a [`WalletKind`], a closed tagged variant
//! selected once at construction. Each variant carries exactly the
//! capability interface the providers need for that chain family: address
//! and network on both, asset-metadata reads and EIP-712 signing on EVM
//! only.

use async_trait::async_trait;
use std::sync::Arc;

use alloy_signer::Signer;

use crate::network::{Network, ProtocolFamily};

/// On-chain metadata of a token, as read from its contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDetails {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Errors surfaced by wallet capability calls.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// An on-chain read failed (transport, revert, or decode).
    #[error("contract read failed: {0}")]
    ContractRead(String),
    /// The wallet does not support the requested capability.
    #[error("unsupported wallet operation: {0}")]
    Unsupported(&'static str),
}

/// Capabilities of a wallet on an EVM chain.
#[async_trait]
pub trait EvmWalletProvider: Send + Sync {
    /// The wallet's checksummed address.
    fn address(&self) -> String;

    /// The network the wallet is connected to.
    fn network(&self) -> Network;

    /// Reads name, symbol, and decimals from a token contract.
    async fn token_details(&self, asset: &str) -> Result<TokenDetails, WalletError>;

    /// The signer used for EIP-712 payment authorizations.
    fn signer(&self) -> Arc<dyn Signer + Send + Sync>;
}

/// Capabilities of a wallet on a Solana chain.
pub trait SvmWalletProvider: Send + Sync {
    /// The wallet's base58 address.
    fn address(&self) -> String;

    /// The network the wallet is connected to.
    fn network(&self) -> Network;
}

/// A wallet of either chain family.
#[derive(Clone)]
pub enum WalletKind {
    Evm(Arc<dyn EvmWalletProvider>),
    Svm(Arc<dyn SvmWalletProvider>),
}

impl WalletKind {
    /// The network the wallet is connected to.
    pub fn network(&self) -> Network {
        match self {
            WalletKind::Evm(wallet) => wallet.network(),
            WalletKind::Svm(wallet) => wallet.network(),
        }
    }

    /// The wallet's address in its chain family's native format.
    pub fn address(&self) -> String {
        match self {
            WalletKind::Evm(wallet) => wallet.address(),
            WalletKind::Svm(wallet) => wallet.address(),
        }
    }

    /// The chain family of the wallet.
    pub fn protocol_family(&self) -> ProtocolFamily {
        match self {
            WalletKind::Evm(_) => ProtocolFamily::Evm,
            WalletKind::Svm(_) => ProtocolFamily::Svm,
        }
    }

    /// The EVM capability interface, when this is an EVM wallet.
    pub fn as_evm(&self) -> Option<&Arc<dyn EvmWalletProvider>> {
        match self {
            WalletKind::Evm(wallet) => Some(wallet),
            WalletKind::Svm(_) => None,
        }
    }
}
