//! x402 protocol version 2 wire types.
//!
//! V2 identifies networks by CAIP-2 chain id (e.g. "eip155:84532") and
//! delivers payment requirements as base64-encoded JSON in the
//! `payment-required` response header. The amount field is named `amount`,
//! and resource metadata (description, MIME type, URL) moves out of the
//! individual options into a dedicated [`ResourceInfo`] block.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{VecSkipError, serde_as};
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::chain::ChainId;

/// Version marker for x402 protocol version 2, serialized as the integer `2`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct X402Version2;

impl X402Version2 {
    pub const VALUE: u8 = 2;
}

impl From<X402Version2> for u8 {
    fn from(_: X402Version2) -> Self {
        X402Version2::VALUE
    }
}

impl Serialize for X402Version2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version2 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let num = u8::deserialize(deserializer)?;
        if num == Self::VALUE {
            Ok(X402Version2)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected version {}, got {}",
                Self::VALUE,
                num
            )))
        }
    }
}

impl Display for X402Version2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

/// Metadata about the resource being paid for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// Human-readable description of the resource.
    #[serde(default)]
    pub description: String,
    /// MIME type of the resource content.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// URL of the resource.
    #[serde(default)]
    pub url: Option<String>,
}

/// Payment terms offered by the seller in a V2 402 response.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g. "exact").
    pub scheme: String,
    /// The CAIP-2 chain id (e.g. "eip155:84532").
    pub network: ChainId,
    /// The payment amount, in atomic token units.
    pub amount: String,
    /// The recipient address for payment.
    pub pay_to: String,
    /// Maximum time in seconds for payment validity.
    #[serde(default)]
    pub max_timeout_seconds: Option<u64>,
    /// The token asset address.
    pub asset: String,
    /// Scheme-specific extra data (e.g. the EIP-712 domain name/version).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// HTTP 402 Payment Required payload for V2, decoded from the
/// `payment-required` header.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 2).
    pub x402_version: X402Version2,
    /// Optional error message if the request was malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Information about the resource being paid for.
    #[serde(default)]
    pub resource: Option<ResourceInfo>,
    /// Protocol extensions advertised by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
    /// List of acceptable payment methods. Malformed entries are skipped.
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_marker_roundtrip() {
        assert_eq!(serde_json::to_string(&X402Version2).unwrap(), "2");
        assert!(serde_json::from_str::<X402Version2>("1").is_err());
    }

    #[test]
    fn parses_header_payload() {
        let payload = serde_json::json!({
            "x402Version": 2,
            "resource": {
                "description": "Hourly forecast",
                "mimeType": "application/json",
                "url": "https://api.example.com/forecast"
            },
            "accepts": [{
                "scheme": "exact",
                "network": "eip155:84532",
                "amount": "10000",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
            }]
        });
        let parsed: PaymentRequired = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.accepts.len(), 1);
        assert_eq!(parsed.accepts[0].network.to_string(), "eip155:84532");
        assert_eq!(parsed.accepts[0].amount, "10000");
        assert_eq!(parsed.resource.unwrap().description, "Hourly forecast");
    }
}
