//! Action providers for on-chain agents.
//!
//! An *action provider* exposes a small set of callable actions (discover
//! payable services, make a paid HTTP request, query a wallet) that a
//! higher-level agent framework discovers through JSON-schema-described
//! inputs and invokes with JSON arguments. This crate is the foundation the
//! providers build on:
//!
//! - [`action`] - the provider trait, action descriptors, and schema helpers
//! - [`network`] - the network model (protocol family + toolkit network id)
//! - [`wallet`] - the wallet abstraction as a closed tagged variant
//!   ([`wallet::WalletKind`]) carrying exactly the capabilities providers
//!   need per chain family
//!
//! The x402 payment provider lives in the `agentpay-x402` crate; shared
//! protocol types live in `agentpay-types`.

pub mod action;
pub mod network;
pub mod wallet;

pub use action::{ActionDescriptor, ActionProvider, parse_args, schema_for};
pub use network::{Network, ProtocolFamily};
pub use wallet::{EvmWalletProvider, SvmWalletProvider, TokenDetails, WalletError, WalletKind};
