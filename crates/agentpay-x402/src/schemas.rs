//! Input schemas for the x402 actions.
//!
//! Argument structs derive `JsonSchema` so the host framework can present
//! each action's input contract to the model; validation is by
//! deserialization at dispatch time.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP methods accepted by the request actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Whether a request body is meaningful for this method.
    pub fn can_have_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    /// The method used by the 404 fallback retry: GET becomes POST, every
    /// other method becomes GET.
    pub fn flipped(self) -> Self {
        match self {
            HttpMethod::Get => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Arguments for `discover_x402_services`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiscoverServicesArgs {
    /// Facilitator to query: "cdp", "payai", or a registered custom
    /// facilitator name.
    #[serde(default)]
    pub facilitator: Option<String>,
    /// Maximum price in whole USDC units (e.g. 0.1 for 0.10 USDC). Only
    /// USDC payment options are considered when the filter applies.
    #[serde(default)]
    pub max_usdc_price: Option<f64>,
    /// Accepted x402 protocol versions (1 or 2). Both by default.
    #[serde(default)]
    pub x402_versions: Option<Vec<u8>>,
    /// Case-insensitive keyword matched against service descriptions and
    /// URLs.
    #[serde(default)]
    pub keyword: Option<String>,
}

/// Shared request fields for the HTTP actions.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HttpRequestArgs {
    /// The URL of the API endpoint (can be localhost for development).
    pub url: String,
    /// The HTTP method to use. Defaults to GET.
    #[serde(default)]
    pub method: Option<HttpMethod>,
    /// Optional headers to include in the request.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    /// Query parameters appended to the URL. Use only for GET/DELETE; for
    /// POST/PUT/PATCH send data in `body` instead.
    #[serde(default)]
    pub query_params: Option<BTreeMap<String, String>>,
    /// Request body, required for POST/PUT/PATCH when sending data.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

impl HttpRequestArgs {
    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }
}

/// A payment option as selected by the agent, supporting both wire
/// versions' amount field spellings.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectedPaymentOption {
    /// Payment scheme (e.g. "exact").
    pub scheme: String,
    /// Network identifier (V1 name like "base-sepolia" or CAIP-2 like
    /// "eip155:84532").
    pub network: String,
    /// Asset address or identifier.
    pub asset: String,
    /// Amount in atomic units (V1 spelling).
    #[serde(default, alias = "maxAmountRequired")]
    pub max_amount_required: Option<String>,
    /// Amount in atomic units (V2 spelling).
    #[serde(default)]
    pub amount: Option<String>,
    /// Decimal price (V2 listings, e.g. "$0.01").
    #[serde(default)]
    pub price: Option<String>,
    /// Payment recipient address.
    #[serde(default, alias = "payTo")]
    pub pay_to: Option<String>,
    /// The resource URL this option was offered for.
    #[serde(default)]
    pub resource: Option<String>,
    /// Scheme-specific extra data, passed through from the 402 response.
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

impl SelectedPaymentOption {
    /// The authoritative amount: `max_amount_required`, then `amount`, then
    /// `price`.
    pub fn amount(&self) -> Option<&str> {
        self.max_amount_required
            .as_deref()
            .or(self.amount.as_deref())
            .or(self.price.as_deref())
    }
}

/// Arguments for `retry_http_request_with_x402`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RetryWithPaymentArgs {
    #[serde(flatten)]
    pub request: HttpRequestArgs,
    /// The exact payment option object from `acceptablePaymentOptions`,
    /// unmodified. The amount field is in atomic units.
    pub selected_payment_option: SelectedPaymentOption,
}

/// Arguments for `register_x402_service`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RegisterServiceArgs {
    /// Service URL to allow-list for x402 requests.
    pub url: String,
}

/// Empty argument object for the listing actions.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct EmptyArgs {}
