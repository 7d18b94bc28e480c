//! x402 action provider.
//!
//! This crate lets an on-chain agent discover payable HTTP services and pay
//! for them over the [x402](https://www.x402.org) protocol. It exposes a
//! provider with two flows:
//!
//! - **Two-step (recommended)**: `make_http_request` performs a plain
//!   request and, on a 402 Payment Required response, reports the offered
//!   payment options so the agent can confirm with the user before calling
//!   `retry_http_request_with_x402` with the chosen option.
//! - **Direct**: `make_http_request_with_x402` pays automatically without a
//!   confirmation step; documented as the implicit path and not the default.
//!
//! Service discovery (`discover_x402_services`) queries a facilitator's
//! listing with pagination and applies a filter pipeline (network, version,
//! keyword, price ceiling) before presenting simplified results.
//!
//! Requests are only issued to allow-listed service URLs; allow-listing is
//! static by configuration or dynamic via `register_x402_service` when
//! enabled.
//!
//! # Modules
//!
//! - [`config`] - provider configuration and the facilitator registry
//! - [`discovery`] - paginated listing fetch with bounded retry
//! - [`filters`] - the resource filter pipeline
//! - [`format`] - payment-option formatting and unit conversion
//! - [`payments`] - the reqwest middleware that signs and attaches payments
//! - [`request`] - plain request plumbing and response parsing
//! - [`provider`] - the action provider tying it all together

pub mod config;
pub mod discovery;
pub mod filters;
pub mod format;
pub mod payments;
pub mod provider;
pub mod request;
pub mod schemas;

pub use config::X402Config;
pub use provider::X402ActionProvider;
