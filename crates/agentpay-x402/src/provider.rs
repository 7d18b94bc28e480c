//! The x402 action provider.
//!
//! Every action returns a JSON string the calling agent can inspect:
//! successes and failures alike are data, so the host framework never needs
//! exception handling around provider calls. The only hard failures are in
//! construction paths where continuing would be unsafe (e.g. wiring a
//! payment interceptor to a wallet that cannot sign).

use std::collections::BTreeSet;
use std::sync::RwLock;

use async_trait::async_trait;
use http::StatusCode;
use reqwest_middleware as rqm;
use serde_json::json;
use url::Url;

use agentpay::{
    ActionDescriptor, ActionProvider, Network, ProtocolFamily, WalletKind, parse_args, schema_for,
};
use agentpay_types::networks;
use agentpay_types::proto::PaymentOption;
use agentpay_types::util::format_units;

use crate::config::{DEFAULT_FACILITATOR, KNOWN_FACILITATORS, X402Config};
use crate::discovery::{RetryPolicy, fetch_all_resources};
use crate::filters;
use crate::format::{self, FormatOption};
use crate::payments::{PaymentError, PaymentInterceptor, parse_payment_required};
use crate::request::{
    build_url_with_params, parse_response_data, proof_from_headers, send_once,
    send_with_method_flip, transport_error_json,
};
use crate::schemas::{
    DiscoverServicesArgs, EmptyArgs, HttpRequestArgs, RegisterServiceArgs, RetryWithPaymentArgs,
};

/// Resources fetched per discovery page.
const DISCOVERY_PAGE_SIZE: u64 = 1000;

/// USDC atomic units per whole unit (6 decimals).
const USDC_DECIMALS: u32 = 6;

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn plain_client() -> rqm::ClientWithMiddleware {
    rqm::ClientBuilder::new(reqwest::Client::new()).build()
}

/// Action provider for discovering and paying x402 services.
pub struct X402ActionProvider {
    config: X402Config,
    registered_services: RwLock<BTreeSet<String>>,
    retry_policy: RetryPolicy,
}

impl X402ActionProvider {
    /// Creates a provider, resolving environment overrides and seeding the
    /// service allow-list from the configuration.
    pub fn new(config: X402Config) -> Self {
        let config = config.resolve_env();
        let registered_services = config.registered_services.iter().cloned().collect();
        Self {
            config,
            registered_services: RwLock::new(registered_services),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the discovery retry policy. Mostly useful for compressing
    /// backoff delays in tests.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Whether a URL is allow-listed, by origin or prefix match.
    fn is_url_allowed(&self, url: &str) -> bool {
        let services = self
            .registered_services
            .read()
            .expect("service allow-list lock poisoned");
        if services.is_empty() {
            return false;
        }
        let origin = Url::parse(url)
            .ok()
            .map(|parsed| parsed.origin().ascii_serialization());
        services.iter().any(|registered| {
            origin.as_deref() == Some(registered.as_str()) || url.starts_with(registered)
        })
    }

    fn service_not_registered(&self, url: &str, with_suggestion: bool) -> serde_json::Value {
        let services: Vec<String> = self
            .registered_services
            .read()
            .expect("service allow-list lock poisoned")
            .iter()
            .cloned()
            .collect();
        let mut result = json!({
            "error": true,
            "message": "Service not registered",
            "details": format!(
                "The service URL \"{url}\" is not registered. Only approved services can be called."
            ),
            "registeredServices": services,
        });
        if with_suggestion {
            let suggestion = if self.config.allow_dynamic_service_registration {
                "Use register_x402_service to register this service first."
            } else {
                "Dynamic service registration is disabled. Only pre-registered services can be \
                 used. Enable allow_dynamic_service_registration in the provider configuration \
                 to register services at runtime."
            };
            result["suggestion"] = json!(suggestion);
        }
        result
    }

    /// Discovers available x402 services, filtered to the wallet's network
    /// and the caller's criteria.
    pub async fn discover_services(&self, wallet: &WalletKind, args: DiscoverServicesArgs) -> String {
        let facilitator = args
            .facilitator
            .unwrap_or_else(|| DEFAULT_FACILITATOR.to_string());
        let Some(base_url) = self.config.resolve_facilitator(&facilitator) else {
            return pretty(&json!({
                "error": true,
                "message": "Facilitator not allowed",
                "details": format!(
                    "The facilitator \"{facilitator}\" is not recognized. Use one of: {}",
                    self.config.facilitator_names().join(", ")
                ),
            }));
        };
        let discovery_url = format!("{base_url}/discovery/resources");

        let client = reqwest::Client::new();
        let all_resources = fetch_all_resources(
            &client,
            &discovery_url,
            DISCOVERY_PAGE_SIZE,
            &self.retry_policy,
        )
        .await;
        let total = all_resources.len();
        if total == 0 {
            return pretty(&json!({
                "error": true,
                "message": "No services found",
            }));
        }

        let wallet_networks = wallet.network().x402_aliases();

        let mut filtered = filters::filter_by_network(all_resources, &wallet_networks);
        filtered = filters::filter_by_description(filtered);
        let allowed_versions = args.x402_versions.unwrap_or_else(|| vec![1, 2]);
        filtered = filters::filter_by_version(filtered, &allowed_versions);
        if let Some(keyword) = args.keyword.as_deref() {
            filtered = filters::filter_by_keyword(filtered, keyword);
        }
        let max_usdc_price = args.max_usdc_price.unwrap_or(1.0);
        filtered =
            filters::filter_by_max_price(filtered, max_usdc_price, wallet, &wallet_networks).await;

        let services = format::simplified_resources(&filtered, &wallet_networks, wallet).await;

        pretty(&json!({
            "success": true,
            "services": services,
            "walletNetworks": wallet_networks,
            "total": total,
            "returned": services.len(),
        }))
    }

    /// Makes a plain HTTP request; a 402 response is turned into a report of
    /// the acceptable payment options instead of an error.
    pub async fn make_http_request(&self, wallet: &WalletKind, args: HttpRequestArgs) -> String {
        if !self.is_url_allowed(&args.url) {
            return pretty(&self.service_not_registered(&args.url, true));
        }

        let final_url = build_url_with_params(&args.url, args.query_params.as_ref());
        let method = args.method();
        let client = plain_client();

        let sent = send_with_method_flip(
            &client,
            method,
            &final_url,
            args.headers.as_ref(),
            args.body.as_ref(),
        )
        .await;
        let (response, method) = match sent {
            Ok(sent) => sent,
            Err(error) => return pretty(&transport_error_json(&error, &final_url)),
        };

        if response.status() != StatusCode::PAYMENT_REQUIRED {
            let (status, _headers, data) = parse_response_data(response).await;
            return pretty(&json!({
                "success": true,
                "url": final_url,
                "method": method.as_str(),
                "status": status.as_u16(),
                "data": data,
            }));
        }

        let payment_required = match parse_payment_required(response).await {
            Ok(parsed) => parsed,
            Err(error) => {
                return pretty(&json!({
                    "error": true,
                    "message": format!("Failed to parse payment requirements from {final_url}"),
                    "details": error.to_string(),
                }));
            }
        };

        let wallet_networks = wallet.network().x402_aliases();
        let options = payment_required.options();
        let usdc_options: Vec<PaymentOption> = options
            .iter()
            .filter(|option| format::is_usdc_asset(&option.asset, wallet))
            .cloned()
            .collect();

        if usdc_options.is_empty() {
            return pretty(&json!({
                "error": true,
                "message": "No USDC payment option available",
                "details": "This service does not accept USDC payments. Only USDC payments are supported.",
                "originalOptions": options,
            }));
        }

        let available_networks: Vec<&str> =
            usdc_options.iter().map(|o| o.network.as_str()).collect();
        let has_matching_network = available_networks
            .iter()
            .any(|network| wallet_networks.iter().any(|alias| alias.as_str() == *network));

        let payment_options_text = if has_matching_network {
            let mut formatted = Vec::new();
            for option in usdc_options
                .iter()
                .filter(|o| wallet_networks.contains(&o.network))
            {
                formatted.push(
                    format::format_payment_option(
                        FormatOption {
                            asset: &option.asset,
                            amount: option.amount.as_deref().unwrap_or("0"),
                            network: &option.network,
                        },
                        wallet,
                    )
                    .await,
                );
            }
            format!("The USDC payment options are: {}", formatted.join(", "))
        } else {
            format!(
                "The wallet networks {} do not match any available USDC payment options ({}).",
                wallet_networks.join(", "),
                available_networks.join(", ")
            )
        };

        let mut next_steps = vec![
            "Inform the user that the requested server replied with a 402 Payment Required response."
                .to_string(),
            payment_options_text,
            "Include the description of the service in the response.".to_string(),
            "Identify required or optional query or body parameters from this response and ask \
             the user to provide values, suggesting examples."
                .to_string(),
            "For POST/PUT/PATCH requests, send data in the 'body' parameter, not 'query_params'."
                .to_string(),
        ];
        if has_matching_network {
            next_steps.push("Ask the user if they want to retry the request with payment.".to_string());
            next_steps.push(
                "When calling retry_http_request_with_x402, pass the EXACT payment option object \
                 from acceptablePaymentOptions as selected_payment_option, unmodified. The amount \
                 field is in atomic units (e.g. '10000' = 0.01 USDC)."
                    .to_string(),
            );
        }

        let mut result = json!({
            "status": "error_402_payment_required",
            "acceptablePaymentOptions": usdc_options,
            "nextSteps": next_steps,
        });

        let mut discovery_info = serde_json::Map::new();
        if let Some(description) = payment_required.description() {
            discovery_info.insert("description".to_string(), json!(description));
        }
        if let Some(mime_type) = payment_required.mime_type() {
            discovery_info.insert("mimeType".to_string(), json!(mime_type));
        }
        if let Some(extensions) = payment_required.extensions() {
            discovery_info.insert("extensions".to_string(), extensions.clone());
        }
        if !discovery_info.is_empty() {
            result["discoveryInfo"] = serde_json::Value::Object(discovery_info);
        }

        pretty(&result)
    }

    /// Retries a request with payment after a 402, using the payment option
    /// the caller confirmed.
    pub async fn retry_with_payment(&self, wallet: &WalletKind, args: RetryWithPaymentArgs) -> String {
        let url = &args.request.url;
        if !self.is_url_allowed(url) {
            return pretty(&self.service_not_registered(url, false));
        }

        let selected = &args.selected_payment_option;

        // A stale payment offer must not be replayed against a different
        // resource; reject before any network traffic.
        if let Some(resource) = selected.resource.as_deref() {
            if resource != url {
                return pretty(&json!({
                    "status": "error_invalid_payment_option",
                    "message": "The selected payment option was offered for a different resource",
                    "details": {
                        "optionResource": resource,
                        "requestedUrl": url,
                    },
                }));
            }
        }

        if !format::is_usdc_asset(&selected.asset, wallet) {
            return pretty(&json!({
                "error": true,
                "message": "Only USDC payments are supported",
                "details": format!(
                    "The selected payment asset \"{}\" is not USDC.",
                    selected.asset
                ),
            }));
        }

        let amount_str = selected.amount().unwrap_or("0");
        let Ok(requested) = amount_str.parse::<u128>() else {
            return pretty(&json!({
                "error": true,
                "message": "Invalid payment amount",
                "details": format!(
                    "The selected payment amount \"{amount_str}\" is not an atomic-unit integer."
                ),
            }));
        };
        let max_atomic = (self.config.max_payment_usdc * 10f64.powi(USDC_DECIMALS as i32)) as u128;
        if requested > max_atomic {
            return pretty(&json!({
                "error": true,
                "message": "Payment exceeds limit",
                "details": format!(
                    "The requested payment of {} USDC exceeds the maximum spending limit of {} USDC.",
                    format_units(requested, USDC_DECIMALS),
                    self.config.max_payment_usdc
                ),
                "maxPaymentUsdc": self.config.max_payment_usdc,
            }));
        }

        let wallet_networks = wallet.network().x402_aliases();
        if !wallet_networks.contains(&selected.network) {
            return pretty(&json!({
                "error": true,
                "message": "Network mismatch",
                "details": format!(
                    "Wallet is on {} but payment requires {}",
                    wallet_networks.join(", "),
                    selected.network
                ),
            }));
        }

        let interceptor =
            match PaymentInterceptor::for_wallet(wallet, self.config.max_payment_usdc) {
                Ok(interceptor) => {
                    interceptor.with_selected(selected.network.clone(), selected.asset.clone())
                }
                Err(PaymentError::UnsupportedWallet(details)) => {
                    return pretty(&json!({
                        "error": true,
                        "message": "Unsupported wallet provider",
                        "details": details,
                    }));
                }
                Err(error) => {
                    return pretty(&json!({
                        "error": true,
                        "message": "Failed to prepare payment",
                        "details": error.to_string(),
                    }));
                }
            };
        let client = rqm::ClientBuilder::new(reqwest::Client::new())
            .with(interceptor)
            .build();

        let final_url = build_url_with_params(url, args.request.query_params.as_ref());
        let method = args.request.method();

        let sent = send_once(
            &client,
            method,
            &final_url,
            args.request.headers.as_ref(),
            args.request.body.as_ref(),
        )
        .await;
        let response = match sent {
            Ok(response) => response,
            Err(error) => return pretty(&transport_error_json(&error, &final_url)),
        };

        let (status, headers, data) = parse_response_data(response).await;
        let payment_proof = proof_from_headers(&headers);

        // The payment protocol only guarantees settlement on 200.
        if status != StatusCode::OK {
            return pretty(&json!({
                "status": "error",
                "message": format!(
                    "Request failed with status {}. Payment was not settled.",
                    status.as_u16()
                ),
                "httpStatus": status.as_u16(),
                "data": data,
                "details": {
                    "url": final_url,
                    "method": method.as_str(),
                },
            }));
        }

        pretty(&json!({
            "status": "success",
            "data": data,
            "message": "Request completed successfully with payment",
            "details": {
                "url": final_url,
                "method": method.as_str(),
                "paymentUsed": {
                    "network": selected.network,
                    "asset": selected.asset,
                    "amount": selected.amount(),
                },
                "paymentProof": payment_proof,
            },
        }))
    }

    /// Makes a request with automatic payment handling, skipping the
    /// confirmation step between seeing a price and paying it. The implicit
    /// path; prefer the two-step flow.
    pub async fn direct_request_with_payment(
        &self,
        wallet: &WalletKind,
        args: HttpRequestArgs,
    ) -> String {
        if !self.is_url_allowed(&args.url) {
            return pretty(&self.service_not_registered(&args.url, true));
        }

        let interceptor = match PaymentInterceptor::for_wallet(wallet, self.config.max_payment_usdc)
        {
            Ok(interceptor) => interceptor,
            Err(PaymentError::UnsupportedWallet(details)) => {
                return pretty(&json!({
                    "error": true,
                    "message": "Unsupported wallet provider",
                    "details": details,
                }));
            }
            Err(error) => {
                return pretty(&json!({
                    "error": true,
                    "message": "Failed to prepare payment",
                    "details": error.to_string(),
                }));
            }
        };
        let client = rqm::ClientBuilder::new(reqwest::Client::new())
            .with(interceptor)
            .build();

        let final_url = build_url_with_params(&args.url, args.query_params.as_ref());
        let method = args.method();

        let sent = send_once(
            &client,
            method,
            &final_url,
            args.headers.as_ref(),
            args.body.as_ref(),
        )
        .await;
        let response = match sent {
            Ok(response) => response,
            Err(error) => return pretty(&transport_error_json(&error, &final_url)),
        };

        let (status, headers, data) = parse_response_data(response).await;
        let payment_proof = proof_from_headers(&headers);

        if status != StatusCode::OK {
            return pretty(&json!({
                "success": false,
                "message": format!(
                    "Request failed with status {}. Payment was not settled.",
                    status.as_u16()
                ),
                "url": final_url,
                "method": method.as_str(),
                "status": status.as_u16(),
                "data": data,
            }));
        }

        pretty(&json!({
            "success": true,
            "message": "Request completed successfully (payment handled automatically if required)",
            "url": final_url,
            "method": method.as_str(),
            "status": status.as_u16(),
            "data": data,
            "paymentProof": payment_proof,
        }))
    }

    /// Allow-lists a service URL for subsequent requests, when dynamic
    /// registration is enabled.
    pub fn register_service(&self, args: RegisterServiceArgs) -> String {
        if !self.config.allow_dynamic_service_registration {
            return pretty(&json!({
                "error": true,
                "message": "Dynamic service registration is disabled",
                "details": "The provider is configured with allow_dynamic_service_registration \
                            disabled. Services must be pre-registered.",
            }));
        }

        let valid = Url::parse(&args.url)
            .map(|parsed| parsed.has_host())
            .unwrap_or(false);
        if !valid {
            return pretty(&json!({
                "error": true,
                "message": "Invalid URL format",
                "details": format!("\"{}\" is not a valid URL.", args.url),
            }));
        }

        let mut services = self
            .registered_services
            .write()
            .expect("service allow-list lock poisoned");
        services.insert(args.url.clone());

        pretty(&json!({
            "success": true,
            "message": "Service registered successfully",
            "registeredUrl": args.url,
            "totalRegisteredServices": services.len(),
        }))
    }

    /// Lists the currently allow-listed service URLs.
    pub fn list_registered_services(&self) -> String {
        let services: Vec<String> = self
            .registered_services
            .read()
            .expect("service allow-list lock poisoned")
            .iter()
            .cloned()
            .collect();
        let note = if self.config.allow_dynamic_service_registration {
            "You can register new services using register_x402_service."
        } else {
            "Dynamic service registration is disabled. Only pre-registered services can be used."
        };
        pretty(&json!({
            "success": true,
            "registeredServices": services,
            "count": services.len(),
            "allowDynamicServiceRegistration": self.config.allow_dynamic_service_registration,
            "note": note,
        }))
    }

    /// Lists the facilitators usable with `discover_x402_services`.
    pub fn list_registered_facilitators(&self) -> String {
        let known: Vec<serde_json::Value> = KNOWN_FACILITATORS
            .iter()
            .map(|(name, url)| json!({"name": name, "url": url, "type": "known"}))
            .collect();
        let custom: Vec<serde_json::Value> = self
            .config
            .registered_facilitators
            .iter()
            .map(|(name, url)| json!({"name": name, "url": url, "type": "custom"}))
            .collect();
        let known_count = known.len();
        let custom_count = custom.len();
        let facilitators: Vec<serde_json::Value> = known.into_iter().chain(custom).collect();

        pretty(&json!({
            "success": true,
            "facilitators": facilitators,
            "knownCount": known_count,
            "customCount": custom_count,
            "totalCount": known_count + custom_count,
            "note": "Use the 'facilitator' parameter in discover_x402_services to query a \
                     specific facilitator by name.",
        }))
    }
}

#[async_trait]
impl ActionProvider for X402ActionProvider {
    fn name(&self) -> &str {
        "x402"
    }

    fn actions(&self) -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor {
                name: "discover_x402_services",
                description: "Discover available x402 services. Only services available on the \
                              current network are returned. Optionally filter by protocol \
                              version, keyword, and a maximum price in whole USDC units.",
                input_schema: schema_for::<DiscoverServicesArgs>(),
            },
            ActionDescriptor {
                name: "make_http_request",
                description: "Make a basic HTTP request to an API endpoint. If the endpoint \
                              requires payment (402), the response lists payment options to use \
                              with retry_http_request_with_x402.",
                input_schema: schema_for::<HttpRequestArgs>(),
            },
            ActionDescriptor {
                name: "retry_http_request_with_x402",
                description: "Retry an HTTP request with x402 payment after a 402 Payment \
                              Required response. Pass the exact payment option object from \
                              acceptablePaymentOptions, unmodified.",
                input_schema: schema_for::<RetryWithPaymentArgs>(),
            },
            ActionDescriptor {
                name: "make_http_request_with_x402",
                description: "Make an HTTP request with automatic x402 payment handling. \
                              WARNING: pays without a confirmation step; prefer \
                              make_http_request followed by retry_http_request_with_x402.",
                input_schema: schema_for::<HttpRequestArgs>(),
            },
            ActionDescriptor {
                name: "register_x402_service",
                description: "Allow-list a service URL for x402 requests. Only available when \
                              dynamic service registration is enabled.",
                input_schema: schema_for::<RegisterServiceArgs>(),
            },
            ActionDescriptor {
                name: "list_registered_services",
                description: "List the service URLs currently approved for x402 requests.",
                input_schema: schema_for::<EmptyArgs>(),
            },
            ActionDescriptor {
                name: "list_registered_facilitators",
                description: "List the facilitators usable with discover_x402_services.",
                input_schema: schema_for::<EmptyArgs>(),
            },
        ]
    }

    fn supports_network(&self, network: &Network) -> bool {
        let Some(network_id) = network.network_id.as_deref() else {
            return false;
        };
        if !networks::is_supported(network_id) {
            return false;
        }
        if network_id.starts_with("base-") {
            return network.protocol_family == ProtocolFamily::Evm;
        }
        if network_id.starts_with("solana-") {
            return network.protocol_family == ProtocolFamily::Svm;
        }
        false
    }

    async fn invoke(&self, wallet: &WalletKind, action: &str, args: serde_json::Value) -> String {
        macro_rules! dispatch {
            ($ty:ty, $call:expr) => {
                match parse_args::<$ty>(&args) {
                    Ok(parsed) => $call(parsed).await,
                    Err(details) => pretty(&json!({
                        "error": true,
                        "message": "Invalid input",
                        "details": details,
                    })),
                }
            };
        }

        match action {
            "discover_x402_services" => dispatch!(DiscoverServicesArgs, |parsed| self
                .discover_services(wallet, parsed)),
            "make_http_request" => {
                dispatch!(HttpRequestArgs, |parsed| self.make_http_request(wallet, parsed))
            }
            "retry_http_request_with_x402" => dispatch!(RetryWithPaymentArgs, |parsed| self
                .retry_with_payment(wallet, parsed)),
            "make_http_request_with_x402" => dispatch!(HttpRequestArgs, |parsed| self
                .direct_request_with_payment(wallet, parsed)),
            "register_x402_service" => match parse_args::<RegisterServiceArgs>(&args) {
                Ok(parsed) => self.register_service(parsed),
                Err(details) => pretty(&json!({
                    "error": true,
                    "message": "Invalid input",
                    "details": details,
                })),
            },
            "list_registered_services" => self.list_registered_services(),
            "list_registered_facilitators" => self.list_registered_facilitators(),
            unknown => pretty(&json!({
                "error": true,
                "message": format!("Unknown action \"{unknown}\" for provider x402"),
            })),
        }
    }
}
