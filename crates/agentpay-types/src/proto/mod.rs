//! x402 wire types and the normalized internal representation.
//!
//! The protocol exists in two wire versions ([`v1`] and [`v2`]) that differ
//! in network identifier format, amount field name, and where resource
//! metadata lives. Version-specific parsing is isolated to the two wire
//! modules and the small adapters on [`PaymentOption`]; everything past the
//! parse boundary (filters, formatter, orchestrator) works on the
//! normalized types defined here, so version conditionals do not leak
//! further into the codebase.

use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{VecSkipError, serde_as};

use crate::util::Base64Bytes;

pub mod v1;
pub mod v2;

/// A 402 Payment Required payload in either protocol version.
#[derive(Debug, Clone)]
pub enum PaymentRequired {
    /// V1, parsed from the JSON response body.
    V1(v1::PaymentRequired),
    /// V2, parsed from the base64 `payment-required` response header.
    V2(v2::PaymentRequired),
}

impl PaymentRequired {
    /// Decodes a V2 payload from the raw bytes of a `payment-required`
    /// header (base64-encoded JSON).
    pub fn from_payment_required_header(raw: &[u8]) -> Option<Self> {
        let decoded = Base64Bytes::from(raw).decode().ok()?;
        let parsed = serde_json::from_slice::<v2::PaymentRequired>(&decoded).ok()?;
        Some(PaymentRequired::V2(parsed))
    }

    /// Parses a V1 payload from the bytes of a 402 response body.
    pub fn from_body(bytes: &[u8]) -> Option<Self> {
        let parsed = serde_json::from_slice::<v1::PaymentRequired>(bytes).ok()?;
        Some(PaymentRequired::V1(parsed))
    }

    /// The protocol version of this payload.
    pub fn version(&self) -> u8 {
        match self {
            PaymentRequired::V1(_) => v1::X402Version1::VALUE,
            PaymentRequired::V2(_) => v2::X402Version2::VALUE,
        }
    }

    /// The offered payment methods, normalized.
    pub fn options(&self) -> Vec<PaymentOption> {
        match self {
            PaymentRequired::V1(inner) => inner.accepts.iter().map(PaymentOption::from_v1).collect(),
            PaymentRequired::V2(inner) => inner
                .accepts
                .iter()
                .map(|req| PaymentOption::from_v2(req, inner.resource.as_ref()))
                .collect(),
        }
    }

    /// The resource description, where the payload carries one (V2 only).
    pub fn description(&self) -> Option<&str> {
        match self {
            PaymentRequired::V1(_) => None,
            PaymentRequired::V2(inner) => inner
                .resource
                .as_ref()
                .map(|r| r.description.as_str())
                .filter(|d| !d.is_empty()),
        }
    }

    /// The resource MIME type, where the payload carries one (V2 only).
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            PaymentRequired::V1(_) => None,
            PaymentRequired::V2(inner) => inner.resource.as_ref().and_then(|r| r.mime_type.as_deref()),
        }
    }

    /// Protocol extensions advertised by the server (V2 only).
    pub fn extensions(&self) -> Option<&serde_json::Value> {
        match self {
            PaymentRequired::V1(_) => None,
            PaymentRequired::V2(inner) => inner.extensions.as_ref(),
        }
    }
}

/// One accepted payment method, normalized across protocol versions.
///
/// Exactly one amount-bearing field is authoritative per wire version
/// (`maxAmountRequired` in V1, `amount` or decimal `price` in V2); the
/// adapters collapse them into [`PaymentOption::amount`]. The value is an
/// atomic-unit integer string except when a V2 listing only advertised a
/// decimal price, in which case downstream conversion decides whether the
/// option is usable.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    /// The payment scheme (e.g. "exact").
    pub scheme: String,
    /// Network identifier as it appeared on the wire (V1 name or CAIP-2).
    pub network: String,
    /// The token asset address.
    pub asset: String,
    /// The required amount, from the version-authoritative field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// The recipient address for payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_to: Option<String>,
    /// The resource URL this option was offered for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Per-option description (V1 puts the resource description here).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Maximum time in seconds for payment validity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_timeout_seconds: Option<u64>,
    /// Protocol version the option was parsed from, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x402_version: Option<u8>,
    /// Scheme-specific extra data (e.g. the EIP-712 domain name/version).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl PaymentOption {
    /// Normalizes a V1 payment requirement.
    pub fn from_v1(req: &v1::PaymentRequirements) -> Self {
        PaymentOption {
            scheme: req.scheme.clone(),
            network: req.network.clone(),
            asset: req.asset.clone(),
            amount: Some(req.max_amount_required.clone()),
            pay_to: Some(req.pay_to.clone()),
            resource: req.resource.clone(),
            description: Some(req.description.clone()).filter(|d| !d.is_empty()),
            max_timeout_seconds: req.max_timeout_seconds,
            x402_version: Some(v1::X402Version1::VALUE),
            extra: req.extra.clone(),
        }
    }

    /// Normalizes a V2 payment requirement, borrowing the resource metadata
    /// from the payload-level [`v2::ResourceInfo`].
    pub fn from_v2(req: &v2::PaymentRequirements, resource: Option<&v2::ResourceInfo>) -> Self {
        PaymentOption {
            scheme: req.scheme.clone(),
            network: req.network.to_string(),
            asset: req.asset.clone(),
            amount: Some(req.amount.clone()),
            pay_to: Some(req.pay_to.clone()),
            resource: resource.and_then(|r| r.url.clone()),
            description: resource
                .map(|r| r.description.clone())
                .filter(|d| !d.is_empty()),
            max_timeout_seconds: req.max_timeout_seconds,
            x402_version: Some(v2::X402Version2::VALUE),
            extra: req.extra.clone(),
        }
    }

    /// Normalizes a raw JSON payment option as found in discovery listings,
    /// which may use either version's field spellings. Returns `None` when
    /// the value is not an object or names no asset or network.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let get_str = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| obj.get(*k))
                .and_then(|v| v.as_str())
                .map(ToOwned::to_owned)
        };
        let network = get_str(&["network"])?;
        let asset = get_str(&["asset"])?;
        Some(PaymentOption {
            scheme: get_str(&["scheme"]).unwrap_or_default(),
            network,
            asset,
            amount: get_str(&[
                "maxAmountRequired",
                "max_amount_required",
                "amount",
                "price",
            ]),
            pay_to: get_str(&["payTo", "pay_to"]),
            resource: get_str(&["resource"]),
            description: get_str(&["description"]).filter(|d| !d.trim().is_empty()),
            max_timeout_seconds: obj
                .get("maxTimeoutSeconds")
                .or_else(|| obj.get("max_timeout_seconds"))
                .and_then(|v| v.as_u64()),
            x402_version: obj
                .get("x402Version")
                .or_else(|| obj.get("x402_version"))
                .and_then(|v| v.as_u64())
                .map(|v| v as u8),
            extra: obj.get("extra").cloned(),
        })
    }
}

impl<'de> Deserialize<'de> for PaymentOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        PaymentOption::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("payment option missing network or asset"))
    }
}

/// One advertised payable resource from a discovery listing.
///
/// Discovery responses mix V1 and V2 resources, so every field is lenient:
/// the URL may appear under `resource` or `url`, the version tag may be
/// absent, and descriptions live in different places per version.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResource {
    /// The resource URL (V1 spelling).
    #[serde(default)]
    pub resource: Option<String>,
    /// The resource URL (V2 spelling).
    #[serde(default)]
    pub url: Option<String>,
    /// Resource type tag (e.g. "http").
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    /// Protocol version advertised for this resource.
    #[serde(default, rename = "x402Version", alias = "x402_version")]
    pub x402_version: Option<u8>,
    /// Accepted payment options; malformed entries are skipped.
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(default)]
    pub accepts: Vec<PaymentOption>,
    /// Additional metadata; V2 resources carry their description here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// When the listing was last updated.
    #[serde(default, rename = "lastUpdated", alias = "last_updated")]
    pub last_updated: Option<serde_json::Value>,
}

impl DiscoveryResource {
    /// The resource URL under either spelling, or the empty string.
    pub fn url(&self) -> &str {
        self.resource
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or_default()
    }

    /// The resource description, version-aware: V2 resources carry it in
    /// `metadata.description`, V1 resources in the first non-empty
    /// per-option description.
    pub fn description(&self) -> String {
        if self.x402_version == Some(2) {
            return self
                .metadata
                .as_ref()
                .and_then(|m| m.get("description"))
                .and_then(|d| d.as_str())
                .unwrap_or_default()
                .to_string();
        }
        self.accepts
            .iter()
            .filter_map(|option| option.description.as_deref())
            .find(|d| !d.trim().is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Pagination block of a discovery page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
    /// Total number of advertised resources across all pages.
    #[serde(default)]
    pub total: u64,
}

/// One page of a discovery listing. The resource array appears under
/// `resources` or `items` depending on the facilitator.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryPage {
    #[serde_as(as = "Option<VecSkipError<_>>")]
    #[serde(default)]
    resources: Option<Vec<DiscoveryResource>>,
    #[serde_as(as = "Option<VecSkipError<_>>")]
    #[serde(default)]
    items: Option<Vec<DiscoveryResource>>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl DiscoveryPage {
    /// The resources on this page, under either field name.
    pub fn into_resources(self) -> Vec<DiscoveryResource> {
        self.resources.or(self.items).unwrap_or_default()
    }

    /// The declared total across all pages, or 0 when the server did not
    /// report one.
    pub fn total(&self) -> u64 {
        self.pagination.as_ref().map(|p| p.total).unwrap_or(0)
    }
}

/// Derived projection of a [`DiscoveryResource`] for presentation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimplifiedResource {
    pub url: String,
    pub price: String,
    pub description: String,
}

/// Decoded evidence of settlement attached to a successful paid response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentProof {
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
}

/// Decodes a settlement proof header value (base64 JSON). When decoding
/// fails the raw header is preserved under a `raw` key instead of erroring,
/// so the caller always gets something to report.
pub fn decode_payment_proof(header: &str) -> serde_json::Value {
    Base64Bytes::from(header.as_bytes())
        .decode()
        .ok()
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
        .unwrap_or_else(|| serde_json::json!({ "raw": header }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_v1_amount_field() {
        let value = serde_json::json!({
            "scheme": "exact",
            "network": "base-sepolia",
            "asset": "0xUSDC",
            "maxAmountRequired": "10000"
        });
        let option = PaymentOption::from_value(&value).unwrap();
        assert_eq!(option.amount.as_deref(), Some("10000"));
    }

    #[test]
    fn normalizes_v2_amount_and_price_fields() {
        let value = serde_json::json!({
            "scheme": "exact",
            "network": "eip155:8453",
            "asset": "0xUSDC",
            "amount": "25000"
        });
        let option = PaymentOption::from_value(&value).unwrap();
        assert_eq!(option.amount.as_deref(), Some("25000"));

        let value = serde_json::json!({
            "network": "eip155:8453",
            "asset": "0xUSDC",
            "price": "$0.01"
        });
        let option = PaymentOption::from_value(&value).unwrap();
        assert_eq!(option.amount.as_deref(), Some("$0.01"));
    }

    #[test]
    fn amount_field_precedence_is_version_ordered() {
        let value = serde_json::json!({
            "network": "base",
            "asset": "0xUSDC",
            "maxAmountRequired": "1",
            "amount": "2",
            "price": "3"
        });
        let option = PaymentOption::from_value(&value).unwrap();
        assert_eq!(option.amount.as_deref(), Some("1"));
    }

    #[test]
    fn rejects_optionless_values() {
        assert!(PaymentOption::from_value(&serde_json::json!("nope")).is_none());
        assert!(PaymentOption::from_value(&serde_json::json!({"network": "base"})).is_none());
    }

    #[test]
    fn payment_required_from_header_and_body() {
        let v2_payload = serde_json::json!({
            "x402Version": 2,
            "resource": {"description": "Forecast", "url": "https://api.example.com/f"},
            "accepts": [{
                "scheme": "exact",
                "network": "eip155:84532",
                "amount": "10000",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
            }]
        });
        let encoded = Base64Bytes::encode(serde_json::to_vec(&v2_payload).unwrap());
        let parsed = PaymentRequired::from_payment_required_header(encoded.as_ref()).unwrap();
        assert_eq!(parsed.version(), 2);
        let options = parsed.options();
        assert_eq!(options[0].network, "eip155:84532");
        assert_eq!(options[0].resource.as_deref(), Some("https://api.example.com/f"));
        assert_eq!(parsed.description(), Some("Forecast"));

        let v1_body = serde_json::json!({
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base-sepolia",
                "maxAmountRequired": "10000",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "asset": "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
            }]
        });
        let bytes = serde_json::to_vec(&v1_body).unwrap();
        let parsed = PaymentRequired::from_body(&bytes).unwrap();
        assert_eq!(parsed.version(), 1);
        assert_eq!(parsed.options()[0].amount.as_deref(), Some("10000"));

        assert!(PaymentRequired::from_payment_required_header(b"not base64 json").is_none());
    }

    #[test]
    fn resource_description_is_version_aware() {
        let v2: DiscoveryResource = serde_json::from_value(serde_json::json!({
            "url": "https://api.example.com/a",
            "x402Version": 2,
            "metadata": {"description": "From metadata"},
            "accepts": [{"network": "eip155:8453", "asset": "0xA", "description": "ignored"}]
        }))
        .unwrap();
        assert_eq!(v2.description(), "From metadata");

        let v1: DiscoveryResource = serde_json::from_value(serde_json::json!({
            "resource": "https://api.example.com/b",
            "x402Version": 1,
            "accepts": [
                {"network": "base", "asset": "0xA", "description": "  "},
                {"network": "base", "asset": "0xB", "description": "From option"}
            ]
        }))
        .unwrap();
        assert_eq!(v1.description(), "From option");
        assert_eq!(v1.url(), "https://api.example.com/b");
    }

    #[test]
    fn discovery_page_field_variants() {
        let page: DiscoveryPage = serde_json::from_value(serde_json::json!({
            "items": [{"url": "https://api.example.com/x", "accepts": []}],
            "pagination": {"limit": 100, "offset": 0, "total": 1}
        }))
        .unwrap();
        assert_eq!(page.total(), 1);
        assert_eq!(page.into_resources().len(), 1);

        let page: DiscoveryPage =
            serde_json::from_value(serde_json::json!({"resources": []})).unwrap();
        assert_eq!(page.total(), 0);
        assert!(page.into_resources().is_empty());
    }

    #[test]
    fn proof_decoding_falls_back_to_raw() {
        let proof = serde_json::json!({"transaction": "0xabc", "network": "base-sepolia", "payer": "0xpayer"});
        let encoded = Base64Bytes::encode(serde_json::to_vec(&proof).unwrap()).to_string();
        let decoded = decode_payment_proof(&encoded);
        assert_eq!(decoded["transaction"], "0xabc");
        let typed: PaymentProof = serde_json::from_value(decoded).unwrap();
        assert_eq!(typed.transaction.as_deref(), Some("0xabc"));
        assert_eq!(typed.payer.as_deref(), Some("0xpayer"));

        let fallback = decode_payment_proof("not-base64!");
        assert_eq!(fallback["raw"], "not-base64!");
    }
}
