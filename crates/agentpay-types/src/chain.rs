//! CAIP-2 chain identifiers.
//!
//! A [CAIP-2](https://standards.chainagnostic.org/CAIPs/caip-2) chain id
//! identifies a blockchain network in a chain-agnostic way. It consists of a
//! namespace (the blockchain ecosystem, e.g. `eip155` or `solana`) and a
//! reference (the chain-specific identifier, e.g. `8453` for Base), joined
//! by a colon.
//!
//! x402 V2 uses CAIP-2 chain ids on the wire where V1 used short network
//! names; [`ChainId::from_network_name`] and [`ChainId::as_network_name`]
//! translate between the two via the [`crate::networks`] registry.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

use crate::networks;

/// A CAIP-2 compliant blockchain identifier, e.g. `eip155:8453`.
///
/// Serializes to and from the colon-separated string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId {
    /// The blockchain namespace (e.g. `eip155` for EVM chains, `solana` for Solana).
    pub namespace: String,
    /// The chain-specific reference (e.g. `8453` for Base).
    pub reference: String,
}

impl ChainId {
    /// Creates a new chain id from namespace and reference components.
    pub fn new<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    /// Creates a chain id from a well-known V1 network name.
    ///
    /// ```
    /// use agentpay_types::chain::ChainId;
    ///
    /// let base = ChainId::from_network_name("base").unwrap();
    /// assert_eq!(base.to_string(), "eip155:8453");
    /// assert!(ChainId::from_network_name("unknown").is_none());
    /// ```
    pub fn from_network_name(network_name: &str) -> Option<Self> {
        networks::by_v1_name(network_name).map(|n| n.chain_id())
    }

    /// Returns the well-known V1 network name for this chain id, if any.
    pub fn as_network_name(&self) -> Option<&'static str> {
        networks::v1_name_by_chain_id(self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.to_string()
    }
}

/// Error returned when parsing an invalid chain id string.
///
/// A valid chain id is `namespace:reference` with both components non-empty.
#[derive(Debug, thiserror::Error)]
#[error("Invalid chain id format {0}")]
pub struct ChainIdFormatError(String);

impl FromStr for ChainId {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(2, ':').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(ChainIdFormatError(s.into()));
        }
        Ok(ChainId {
            namespace: parts[0].into(),
            reference: parts[1].into(),
        })
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChainId::from_str(&s).map_err(de::Error::custom)
    }
}
