//! Provider configuration and the facilitator registry.

use std::collections::BTreeMap;

/// Facilitators known by name out of the box.
pub static KNOWN_FACILITATORS: &[(&str, &str)] = &[
    ("cdp", "https://api.cdp.coinbase.com/platform/v2/x402"),
    ("payai", "https://facilitator.payai.network"),
];

/// Facilitator queried when the caller does not name one.
pub const DEFAULT_FACILITATOR: &str = "cdp";

/// Default per-request payment ceiling, in whole USDC.
pub const DEFAULT_MAX_PAYMENT_USDC: f64 = 1.0;

/// Configuration for the x402 provider.
#[derive(Debug, Clone)]
pub struct X402Config {
    /// Service URLs the agent may call. Only allow-listed services are
    /// reachable through the request actions.
    pub registered_services: Vec<String>,
    /// Whether the agent may allow-list services discovered at runtime.
    pub allow_dynamic_service_registration: bool,
    /// Additional facilitators beyond the known ones, name to URL.
    pub registered_facilitators: BTreeMap<String, String>,
    /// Maximum payment per request, in whole USDC units.
    pub max_payment_usdc: f64,
}

impl Default for X402Config {
    fn default() -> Self {
        Self {
            registered_services: Vec::new(),
            allow_dynamic_service_registration: false,
            registered_facilitators: BTreeMap::new(),
            max_payment_usdc: DEFAULT_MAX_PAYMENT_USDC,
        }
    }
}

impl X402Config {
    /// Applies environment overrides: `X402_ALLOW_DYNAMIC_SERVICE_REGISTRATION`
    /// enables dynamic registration, and `X402_MAX_PAYMENT_USDC` replaces the
    /// payment ceiling when the configured value is the default.
    pub fn resolve_env(mut self) -> Self {
        if let Ok(value) = std::env::var("X402_ALLOW_DYNAMIC_SERVICE_REGISTRATION") {
            if value.eq_ignore_ascii_case("true") {
                self.allow_dynamic_service_registration = true;
            }
        }
        if self.max_payment_usdc == DEFAULT_MAX_PAYMENT_USDC {
            if let Some(value) = std::env::var("X402_MAX_PAYMENT_USDC")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
            {
                self.max_payment_usdc = value;
            }
        }
        self
    }

    /// Resolves a facilitator name to its discovery base URL, consulting the
    /// known registry first and the configured custom facilitators second.
    pub fn resolve_facilitator(&self, name: &str) -> Option<String> {
        KNOWN_FACILITATORS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, url)| (*url).to_string())
            .or_else(|| self.registered_facilitators.get(name).cloned())
    }

    /// Every facilitator name the provider accepts.
    pub fn facilitator_names(&self) -> Vec<String> {
        KNOWN_FACILITATORS
            .iter()
            .map(|(name, _)| (*name).to_string())
            .chain(self.registered_facilitators.keys().cloned())
            .collect()
    }
}
