//! Registry of networks supported by the toolkit.
//!
//! Every network is known under three names:
//!
//! - the **toolkit network id** used by wallet providers (e.g. `base-mainnet`),
//! - the **x402 V1 name** used by the original protocol version (e.g. `base`),
//! - the **CAIP-2 chain id** used by x402 V2 (e.g. `eip155:8453`).
//!
//! Discovery listings and 402 responses may carry either x402 format, so
//! callers filter against the full alias set returned by [`x402_aliases`].
//! The registry is pure lookup data; no component owns or mutates it.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::chain::ChainId;

/// A known network with its toolkit id, V1 name, and CAIP-2 components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Toolkit network id (e.g. "base-mainnet", "solana-devnet").
    pub network_id: &'static str,
    /// x402 V1 network name (e.g. "base", "solana-devnet").
    pub v1_name: &'static str,
    /// CAIP-2 namespace (e.g. "eip155", "solana").
    pub namespace: &'static str,
    /// CAIP-2 chain reference (e.g. "8453").
    pub reference: &'static str,
}

impl NetworkInfo {
    /// The CAIP-2 chain id of this network.
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(self.namespace, self.reference)
    }

    /// Both x402 network identifier formats for this network: the V1 name
    /// and the CAIP-2 string.
    pub fn aliases(&self) -> [String; 2] {
        [self.v1_name.to_string(), self.chain_id().to_string()]
    }
}

/// Networks the x402 providers operate on.
pub static KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        network_id: "base-mainnet",
        v1_name: "base",
        namespace: "eip155",
        reference: "8453",
    },
    NetworkInfo {
        network_id: "base-sepolia",
        v1_name: "base-sepolia",
        namespace: "eip155",
        reference: "84532",
    },
    NetworkInfo {
        network_id: "solana-mainnet",
        v1_name: "solana",
        namespace: "solana",
        reference: "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
    },
    NetworkInfo {
        network_id: "solana-devnet",
        v1_name: "solana-devnet",
        namespace: "solana",
        reference: "EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
    },
];

static BY_NETWORK_ID: LazyLock<HashMap<&'static str, &'static NetworkInfo>> =
    LazyLock::new(|| KNOWN_NETWORKS.iter().map(|n| (n.network_id, n)).collect());

static BY_V1_NAME: LazyLock<HashMap<&'static str, &'static NetworkInfo>> =
    LazyLock::new(|| KNOWN_NETWORKS.iter().map(|n| (n.v1_name, n)).collect());

static BY_CHAIN_ID: LazyLock<HashMap<ChainId, &'static NetworkInfo>> =
    LazyLock::new(|| KNOWN_NETWORKS.iter().map(|n| (n.chain_id(), n)).collect());

/// Looks up a network by its toolkit network id.
pub fn by_network_id(network_id: &str) -> Option<&'static NetworkInfo> {
    BY_NETWORK_ID.get(network_id).copied()
}

/// Looks up a network by its x402 V1 name.
pub fn by_v1_name(name: &str) -> Option<&'static NetworkInfo> {
    BY_V1_NAME.get(name).copied()
}

/// Reverse lookup from a CAIP-2 chain id to the V1 network name.
pub fn v1_name_by_chain_id(chain_id: &ChainId) -> Option<&'static str> {
    BY_CHAIN_ID.get(chain_id).map(|n| n.v1_name)
}

/// Whether the given toolkit network id is supported by the x402 providers.
pub fn is_supported(network_id: &str) -> bool {
    BY_NETWORK_ID.contains_key(network_id)
}

/// Returns every x402 network identifier that refers to the given toolkit
/// network id, in both V1 and CAIP-2 formats.
///
/// Unknown network ids are returned as a single-element set so that callers
/// still match listings that use the id verbatim.
pub fn x402_aliases(network_id: &str) -> Vec<String> {
    match by_network_id(network_id) {
        Some(info) => info.aliases().to_vec(),
        None => vec![network_id.to_string()],
    }
}

/// Maps an x402 network identifier (either format) back to the toolkit
/// network id, or returns the identifier unchanged if it is not recognized.
pub fn network_id_for_alias(alias: &str) -> &str {
    if let Some(info) = BY_V1_NAME.get(alias) {
        return info.network_id;
    }
    if let Ok(chain_id) = alias.parse::<ChainId>() {
        if let Some(info) = BY_CHAIN_ID.get(&chain_id) {
            return info.network_id;
        }
    }
    alias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_cover_both_formats() {
        assert_eq!(x402_aliases("base-mainnet"), vec!["base", "eip155:8453"]);
        assert_eq!(
            x402_aliases("base-sepolia"),
            vec!["base-sepolia", "eip155:84532"]
        );
        assert_eq!(
            x402_aliases("solana-mainnet"),
            vec!["solana", "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp"]
        );
    }

    #[test]
    fn unknown_network_id_falls_through() {
        assert_eq!(x402_aliases("arbitrum-one"), vec!["arbitrum-one"]);
    }

    #[test]
    fn alias_reverse_lookup() {
        assert_eq!(network_id_for_alias("base"), "base-mainnet");
        assert_eq!(network_id_for_alias("eip155:84532"), "base-sepolia");
        assert_eq!(
            network_id_for_alias("solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1"),
            "solana-devnet"
        );
        assert_eq!(network_id_for_alias("eip155:1"), "eip155:1");
    }

    #[test]
    fn supported_networks() {
        assert!(is_supported("base-mainnet"));
        assert!(is_supported("solana-devnet"));
        assert!(!is_supported("base"));
        assert!(!is_supported("polygon"));
    }
}
