//! Network identity for wallet providers.

use serde::{Deserialize, Serialize};
use std::fmt;

use agentpay_types::networks;

/// The chain family a wallet operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolFamily {
    /// EVM-compatible chains (eip155 namespace).
    Evm,
    /// Solana chains.
    Svm,
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolFamily::Evm => write!(f, "evm"),
            ProtocolFamily::Svm => write!(f, "svm"),
        }
    }
}

/// The network a wallet is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// The chain family.
    pub protocol_family: ProtocolFamily,
    /// Toolkit network id (e.g. "base-sepolia"), when known.
    pub network_id: Option<String>,
}

impl Network {
    pub fn new(protocol_family: ProtocolFamily, network_id: impl Into<String>) -> Self {
        Self {
            protocol_family,
            network_id: Some(network_id.into()),
        }
    }

    /// Every x402 network identifier (V1 name and CAIP-2) matching this
    /// network. Empty when the network id is unknown.
    pub fn x402_aliases(&self) -> Vec<String> {
        match &self.network_id {
            Some(id) => networks::x402_aliases(id),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_follow_network_id() {
        let network = Network::new(ProtocolFamily::Evm, "base-mainnet");
        assert_eq!(network.x402_aliases(), vec!["base", "eip155:8453"]);

        let unknown = Network {
            protocol_family: ProtocolFamily::Evm,
            network_id: None,
        };
        assert!(unknown.x402_aliases().is_empty());
    }
}
