//! Reqwest middleware for paying x402-protected endpoints.
//!
//! On a 402 Payment Required response the interceptor extracts the payment
//! requirements (V2 header or V1 body), selects an option compatible with
//! the wallet's network, enforces the configured spending ceiling, signs an
//! EIP-3009 `TransferWithAuthorization` payload over EIP-712, and retries
//! the request once with the encoded payment header attached.
//!
//! Only EVM wallets can sign payments; constructing an interceptor for a
//! Solana wallet fails up front rather than at retry time.

use std::sync::Arc;
use std::time::{SystemTime, SystemTimeError};

use alloy_primitives::{Address, FixedBytes, U256, hex};
use alloy_signer::Signer;
use alloy_sol_types::{SolStruct, eip712_domain, sol};
use async_trait::async_trait;
use http::{Extensions, HeaderValue, StatusCode};
use rand::Rng;
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use serde::Serialize;
use tracing::{debug, instrument};

use agentpay::WalletKind;
use agentpay_types::chain::ChainId;
use agentpay_types::networks;
use agentpay_types::proto::{PaymentOption, PaymentRequired};
use agentpay_types::util::{Base64Bytes, MoneyAmount};

use crate::format::is_usdc_asset;

sol! {
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// Errors that can occur while constructing or applying an x402 payment.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The wallet cannot sign x402 payments.
    #[error("unsupported wallet for x402 payments: {0}")]
    UnsupportedWallet(&'static str),
    /// The wallet's network is unknown or not an EVM chain.
    #[error("unsupported payment network {0}")]
    UnsupportedNetwork(String),
    /// The 402 response carried no parseable payment requirements.
    #[error("could not parse payment requirements from 402 response")]
    Parse,
    /// None of the offered options match the wallet's networks and asset
    /// policy.
    #[error("no payment option matches wallet networks {networks:?}")]
    NoMatchingOption { networks: Vec<String> },
    /// The selected amount exceeds the configured spending ceiling.
    #[error("payment amount {requested} exceeds configured maximum {allowed}")]
    AmountTooLarge { requested: u128, allowed: u128 },
    /// The option's amount is not an atomic-unit integer.
    #[error("payment option amount is not an atomic amount: {0}")]
    InvalidAmount(String),
    /// An address in the payment option failed to parse.
    #[error("invalid EVM address in payment option: {0}")]
    InvalidAddress(&'static str),
    /// The request body is a stream and cannot be replayed with a payment.
    #[error("request object is not cloneable; streaming bodies are not supported")]
    RequestNotCloneable,
    /// Reading the system clock failed.
    #[error("failed to read system clock")]
    Clock(#[source] SystemTimeError),
    /// EIP-712 signing failed.
    #[error("failed to sign payment payload")]
    Signing(#[source] alloy_signer::Error),
    /// Serializing the payment payload failed.
    #[error("failed to encode payment payload to json")]
    Encode(#[source] serde_json::Error),
    /// The encoded payload is not a valid header value.
    #[error("failed to encode payment payload to HTTP header")]
    HeaderEncode(#[source] http::header::InvalidHeaderValue),
}

impl From<PaymentError> for rqm::Error {
    fn from(error: PaymentError) -> Self {
        rqm::Error::Middleware(error.into())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExactEvmAuthorization {
    from: String,
    to: String,
    value: String,
    valid_after: String,
    valid_before: String,
    nonce: String,
}

#[derive(Serialize)]
struct ExactEvmPayload {
    signature: String,
    authorization: ExactEvmAuthorization,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentPayloadV1 {
    x402_version: u8,
    scheme: String,
    network: String,
    payload: ExactEvmPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentPayloadV2 {
    x402_version: u8,
    accepted: serde_json::Value,
    payload: ExactEvmPayload,
}

/// Resolves an x402 network identifier (V1 name or CAIP-2) to an EVM chain
/// id.
fn evm_chain_id(network: &str) -> Option<u64> {
    let chain_id = match networks::by_v1_name(network) {
        Some(info) => info.chain_id(),
        None => network.parse::<ChainId>().ok()?,
    };
    if chain_id.namespace != "eip155" {
        return None;
    }
    chain_id.reference.parse::<u64>().ok()
}

/// Middleware that settles 402 responses by signing and attaching an x402
/// payment, then retrying the request once.
pub struct PaymentInterceptor {
    signer: Arc<dyn Signer + Send + Sync>,
    wallet_networks: Vec<String>,
    wallet: WalletKind,
    max_atomic: Option<u128>,
    pinned: Option<(String, String)>,
}

impl PaymentInterceptor {
    /// Binds an interceptor to the wallet's signing capability.
    ///
    /// `max_payment_usdc` caps any single payment, compared in atomic USDC
    /// units. Fails for Solana wallets, which cannot sign x402 payments.
    pub fn for_wallet(wallet: &WalletKind, max_payment_usdc: f64) -> Result<Self, PaymentError> {
        let evm = wallet
            .as_evm()
            .ok_or(PaymentError::UnsupportedWallet(
                "only EVM wallets are currently supported for x402 payments",
            ))?;
        let network = evm.network();
        if network.network_id.is_none() {
            return Err(PaymentError::UnsupportedNetwork("unknown".to_string()));
        }
        let max_atomic = MoneyAmount::try_from(max_payment_usdc)
            .ok()
            .and_then(|amount| amount.to_atomic(6))
            .and_then(|atomic| atomic.parse::<u128>().ok());
        Ok(Self {
            signer: evm.signer(),
            wallet_networks: network.x402_aliases(),
            wallet: wallet.clone(),
            max_atomic,
            pinned: None,
        })
    }

    /// Restricts selection to the option the caller already confirmed,
    /// identified by its network and asset.
    pub fn with_selected(mut self, network: impl Into<String>, asset: impl Into<String>) -> Self {
        self.pinned = Some((network.into(), asset.into()));
        self
    }

    /// Selects the payment option to settle with: wallet-network and USDC
    /// restricted, honoring the pinned selection when one is set.
    fn select_option(&self, options: &[PaymentOption]) -> Result<PaymentOption, PaymentError> {
        let candidates: Vec<&PaymentOption> = options
            .iter()
            .filter(|option| self.wallet_networks.contains(&option.network))
            .filter(|option| is_usdc_asset(&option.asset, &self.wallet))
            .collect();

        let selected = match &self.pinned {
            Some((network, asset)) => candidates.into_iter().find(|option| {
                &option.network == network && option.asset.eq_ignore_ascii_case(asset)
            }),
            None => candidates.into_iter().next(),
        };

        selected
            .cloned()
            .ok_or_else(|| PaymentError::NoMatchingOption {
                networks: self.wallet_networks.clone(),
            })
    }

    /// Ensures the selected amount does not exceed the spending ceiling.
    fn assert_max_amount(&self, amount: u128) -> Result<(), PaymentError> {
        if let Some(max) = self.max_atomic {
            if amount > max {
                return Err(PaymentError::AmountTooLarge {
                    requested: amount,
                    allowed: max,
                });
            }
        }
        Ok(())
    }

    /// Signs the EIP-3009 authorization for the selected option and encodes
    /// the version-appropriate payment header.
    async fn payment_header(
        &self,
        selected: &PaymentOption,
        version: u8,
    ) -> Result<(&'static str, HeaderValue), PaymentError> {
        let amount_str = selected
            .amount
            .as_deref()
            .ok_or_else(|| PaymentError::InvalidAmount("<missing>".to_string()))?;
        let amount = amount_str
            .parse::<u128>()
            .map_err(|_| PaymentError::InvalidAmount(amount_str.to_string()))?;
        self.assert_max_amount(amount)?;

        let chain_id = evm_chain_id(&selected.network)
            .ok_or_else(|| PaymentError::UnsupportedNetwork(selected.network.clone()))?;
        let verifying_contract = selected
            .asset
            .parse::<Address>()
            .map_err(|_| PaymentError::InvalidAddress("asset"))?;
        let pay_to = selected
            .pay_to
            .as_deref()
            .ok_or(PaymentError::InvalidAddress("payTo"))?
            .parse::<Address>()
            .map_err(|_| PaymentError::InvalidAddress("payTo"))?;

        let (name, version_tag) = match &selected.extra {
            Some(extra) => (
                extra
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                extra
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            ),
            None => (String::new(), String::new()),
        };
        let domain = eip712_domain! {
            name: name,
            version: version_tag,
            chain_id: chain_id,
            verifying_contract: verifying_contract,
        };

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(PaymentError::Clock)?
            .as_secs();
        let valid_after = now.saturating_sub(10 * 60);
        let valid_before = now + selected.max_timeout_seconds.unwrap_or(300);
        let nonce: [u8; 32] = rand::rng().random();

        let from = self.signer.address();
        let transfer = TransferWithAuthorization {
            from,
            to: pay_to,
            value: U256::from(amount),
            validAfter: U256::from(valid_after),
            validBefore: U256::from(valid_before),
            nonce: FixedBytes(nonce),
        };
        let signing_hash = transfer.eip712_signing_hash(&domain);
        let signature = self
            .signer
            .sign_hash(&signing_hash)
            .await
            .map_err(PaymentError::Signing)?;
        debug!(network = %selected.network, amount, "Signed payment authorization");

        let payload = ExactEvmPayload {
            signature: hex::encode_prefixed(signature.as_bytes()),
            authorization: ExactEvmAuthorization {
                from: from.to_string(),
                to: pay_to.to_string(),
                value: amount.to_string(),
                valid_after: valid_after.to_string(),
                valid_before: valid_before.to_string(),
                nonce: hex::encode_prefixed(nonce),
            },
        };

        let (header_name, json) = if version == 2 {
            let accepted = serde_json::to_value(selected).map_err(PaymentError::Encode)?;
            (
                "Payment-Signature",
                serde_json::to_vec(&PaymentPayloadV2 {
                    x402_version: 2,
                    accepted,
                    payload,
                })
                .map_err(PaymentError::Encode)?,
            )
        } else {
            (
                "X-Payment",
                serde_json::to_vec(&PaymentPayloadV1 {
                    x402_version: 1,
                    scheme: selected.scheme.clone(),
                    network: selected.network.clone(),
                    payload,
                })
                .map_err(PaymentError::Encode)?,
            )
        };

        let encoded = Base64Bytes::encode(json);
        let value =
            HeaderValue::from_bytes(encoded.as_ref()).map_err(PaymentError::HeaderEncode)?;
        Ok((header_name, value))
    }
}

/// Extracts payment requirements from a 402 response, trying the V2
/// `payment-required` header first and falling back to the V1 JSON body.
/// Consumes the response.
pub async fn parse_payment_required(response: Response) -> Result<PaymentRequired, rqm::Error> {
    let header = response.headers().get("payment-required").cloned();
    let from_header = header
        .and_then(|value| PaymentRequired::from_payment_required_header(value.as_bytes()))
        .filter(|parsed| !parsed.options().is_empty());
    if let Some(parsed) = from_header {
        return Ok(parsed);
    }
    let bytes = response.bytes().await.map_err(rqm::Error::Reqwest)?;
    PaymentRequired::from_body(&bytes).ok_or_else(|| PaymentError::Parse.into())
}

#[async_trait]
impl rqm::Middleware for PaymentInterceptor {
    /// Passes non-402 responses through; on 402, signs a payment for a
    /// matching option and retries the request once with the payment header.
    #[instrument(name = "x402.pay", skip_all, fields(url = %req.url()))]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();
        let res = next.clone().run(req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            return Ok(res);
        }
        debug!("Received 402 Payment Required, constructing payment");

        let payment_required = parse_payment_required(res).await?;
        let version = payment_required.version();
        let selected = self.select_option(&payment_required.options())?;
        let (header_name, header_value) = self.payment_header(&selected, version).await?;

        let mut retry = retry_req.ok_or(PaymentError::RequestNotCloneable)?;
        let headers = retry.headers_mut();
        headers.insert(header_name, header_value);
        headers.insert(
            "Access-Control-Expose-Headers",
            HeaderValue::from_static("X-Payment-Response"),
        );
        next.run(retry, extensions).await
    }
}
