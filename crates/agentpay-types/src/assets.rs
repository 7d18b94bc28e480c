//! Registry of known stablecoin deployments.
//!
//! One table keyed by (toolkit network id, symbol) covers every network the
//! providers support; callers look up by symbol when converting
//! human-entered prices and by address when identifying an asset offered in
//! a payment option. Addresses are kept as strings because the registry
//! spans EVM (hex) and Solana (base58) address formats.
//!
//! Assets not present here fall back to on-chain metadata reads (EVM) or to
//! raw display, per the formatter's degradation policy.

use std::collections::HashMap;
use std::sync::LazyLock;

/// A known token deployment on a specific network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Toolkit network id the deployment lives on.
    pub network_id: &'static str,
    /// Token symbol (e.g. "USDC").
    pub symbol: &'static str,
    /// Deployment address: 0x-prefixed hex on EVM networks, base58 on Solana.
    pub address: &'static str,
    /// Token decimals.
    pub decimals: u8,
}

impl AssetInfo {
    /// Whether `address` refers to this deployment. EVM addresses compare
    /// case-insensitively; Solana addresses are case-sensitive base58.
    pub fn matches_address(&self, address: &str) -> bool {
        if self.address.starts_with("0x") {
            self.address.eq_ignore_ascii_case(address)
        } else {
            self.address == address
        }
    }
}

/// Stablecoin deployments on the supported networks.
pub static KNOWN_ASSETS: &[AssetInfo] = &[
    AssetInfo {
        network_id: "base-mainnet",
        symbol: "USDC",
        address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
        decimals: 6,
    },
    AssetInfo {
        network_id: "base-mainnet",
        symbol: "EURC",
        address: "0x60a3E35Cc302bFA44Cb288Bc5a4F316Fdb1adb42",
        decimals: 6,
    },
    AssetInfo {
        network_id: "base-sepolia",
        symbol: "USDC",
        address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
        decimals: 6,
    },
    AssetInfo {
        network_id: "base-sepolia",
        symbol: "EURC",
        address: "0x808456652fdb597867f38412077A9182bf77359F",
        decimals: 6,
    },
    AssetInfo {
        network_id: "solana-mainnet",
        symbol: "USDC",
        address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        decimals: 6,
    },
    AssetInfo {
        network_id: "solana-devnet",
        symbol: "USDC",
        address: "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
        decimals: 6,
    },
];

static BY_NETWORK_AND_SYMBOL: LazyLock<HashMap<(&'static str, &'static str), &'static AssetInfo>> =
    LazyLock::new(|| {
        KNOWN_ASSETS
            .iter()
            .map(|a| ((a.network_id, a.symbol), a))
            .collect()
    });

/// Looks up a deployment by network id and symbol.
pub fn by_symbol(network_id: &str, symbol: &str) -> Option<&'static AssetInfo> {
    BY_NETWORK_AND_SYMBOL.get(&(network_id, symbol)).copied()
}

/// Looks up a deployment on the given network by its address.
pub fn by_address(network_id: &str, address: &str) -> Option<&'static AssetInfo> {
    KNOWN_ASSETS
        .iter()
        .find(|a| a.network_id == network_id && a.matches_address(address))
}

/// The USDC deployment on the given network, if any.
pub fn usdc(network_id: &str) -> Option<&'static AssetInfo> {
    by_symbol(network_id, "USDC")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usdc_per_network() {
        assert_eq!(
            usdc("base-mainnet").unwrap().address,
            "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
        );
        assert_eq!(
            usdc("solana-devnet").unwrap().address,
            "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"
        );
        assert!(usdc("polygon").is_none());
    }

    #[test]
    fn evm_address_lookup_is_case_insensitive() {
        let found = by_address(
            "base-sepolia",
            "0x036cbd53842c5426634e7929541ec2318f3dcf7e",
        )
        .unwrap();
        assert_eq!(found.symbol, "USDC");
        assert_eq!(found.decimals, 6);
    }

    #[test]
    fn solana_address_lookup_is_exact() {
        assert!(
            by_address(
                "solana-mainnet",
                "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
            )
            .is_some()
        );
        assert!(
            by_address(
                "solana-mainnet",
                "epjfwdd5aufqssqem2qn1xzybapc8g4weggkzwytdt1v"
            )
            .is_none()
        );
    }
}
