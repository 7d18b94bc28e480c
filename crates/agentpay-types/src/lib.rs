//! Core types for the agentpay action providers.
//!
//! This crate provides the foundational types shared by agentpay providers,
//! most importantly the x402 payment protocol wire formats. It is
//! blockchain-agnostic: chain-specific behavior (signing, contract reads)
//! lives behind the wallet abstractions of the `agentpay` crate.
//!
//! # Modules
//!
//! - [`chain`] - CAIP-2 chain identifiers
//! - [`networks`] - Registry of networks supported by the toolkit, with
//!   bidirectional mapping between toolkit network ids, x402 V1 network
//!   names, and CAIP-2 identifiers
//! - [`assets`] - Registry of known stablecoin deployments keyed by
//!   (network id, symbol)
//! - [`proto`] - x402 wire types for protocol V1 and V2, plus the normalized
//!   payment-option representation and discovery types
//! - [`util`] - Helper types (base64, token-unit conversion, money amounts)
//!
//! # Protocol Versions
//!
//! The x402 protocol exists in two wire versions:
//!
//! - **V1** ([`proto::v1`]): network names (e.g. "base-sepolia"), payment
//!   requirements in the 402 response body
//! - **V2** ([`proto::v2`]): CAIP-2 chain ids (e.g. "eip155:84532"), payment
//!   requirements in a base64-encoded `payment-required` response header

pub mod assets;
pub mod chain;
pub mod networks;
pub mod proto;
pub mod util;
