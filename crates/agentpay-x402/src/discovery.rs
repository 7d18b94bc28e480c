//! Paginated discovery fetch with bounded retry.
//!
//! Pages are fetched strictly sequentially with a small delay in between to
//! avoid tripping the facilitator's rate limiting. Each page gets its own
//! retry budget with exponential backoff; a page that exhausts its budget is
//! skipped rather than aborting the whole listing, unless no page has ever
//! succeeded (in which case whatever was collected so far, possibly
//! nothing, is returned).

use std::time::Duration;

use http::StatusCode;
use tracing::warn;

use agentpay_types::proto::{DiscoveryPage, DiscoveryResource};

/// Retry and pacing parameters for the discovery fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries per page beyond the initial attempt.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles per attempt.
    pub initial_delay: Duration,
    /// Fixed delay between consecutive page fetches.
    pub page_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            page_delay: Duration::from_millis(250),
        }
    }
}

/// Errors from a single page fetch.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("HTTP error fetching {context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP status {status} fetching {context}")]
    HttpStatus { context: String, status: StatusCode },
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetches one URL, retrying on any failure with exponential backoff until
/// the policy's retry ceiling is reached.
async fn fetch_page_with_retry(
    client: &reqwest::Client,
    url: &str,
    context: &str,
    policy: &RetryPolicy,
) -> Result<DiscoveryPage, DiscoveryError> {
    let mut attempt = 0u32;
    loop {
        let result = fetch_page(client, url, context).await;
        match result {
            Ok(page) => return Ok(page),
            Err(error) => {
                if attempt >= policy.max_retries {
                    return Err(error);
                }
                let delay = policy.initial_delay * 2u32.pow(attempt);
                warn!(
                    %error,
                    context,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    "Discovery fetch failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    context: &str,
) -> Result<DiscoveryPage, DiscoveryError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| DiscoveryError::Http {
            context: context.to_string(),
            source,
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::HttpStatus {
            context: context.to_string(),
            status,
        });
    }
    response
        .json::<DiscoveryPage>()
        .await
        .map_err(|source| DiscoveryError::Decode {
            context: context.to_string(),
            source,
        })
}

/// Fetches the complete discovery listing by repeated paged fetches.
///
/// The declared `pagination.total` from successful responses is the
/// authoritative stopping bound; accumulation stops on an empty page or once
/// the offset reaches that bound. A failed page is skipped after its retry
/// budget, unless no page has ever succeeded; then the listing is abandoned
/// and whatever was collected is returned.
pub async fn fetch_all_resources(
    client: &reqwest::Client,
    discovery_url: &str,
    page_size: u64,
    policy: &RetryPolicy,
) -> Vec<DiscoveryResource> {
    let mut all_resources: Vec<DiscoveryResource> = Vec::new();
    let mut offset: u64 = 0;
    let mut page_number: u64 = 1;
    let mut known_total: u64 = 0;

    loop {
        let url = format!("{discovery_url}?limit={page_size}&offset={offset}");
        let context = format!("page {page_number}, offset {offset}");

        let page = match fetch_page_with_retry(client, &url, &context, policy).await {
            Ok(page) => page,
            Err(error) => {
                warn!(%error, context, "Skipping discovery page after exhausting retries");
                offset += page_size;
                page_number += 1;

                if known_total > 0 && offset >= known_total {
                    break;
                }
                if known_total == 0 {
                    // Nothing has ever succeeded; the endpoint is likely down.
                    warn!(discovery_url, "Abandoning discovery with no successful pages");
                    break;
                }
                tokio::time::sleep(policy.page_delay).await;
                continue;
            }
        };

        let total = page.total();
        if total > 0 {
            known_total = total;
        }
        let resources = page.into_resources();
        let count = resources.len() as u64;
        all_resources.extend(resources);

        offset += count;
        page_number += 1;

        if count == 0 || offset >= known_total {
            break;
        }
        tokio::time::sleep(policy.page_delay).await;
    }

    all_resources
}
