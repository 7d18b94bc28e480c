//! The discovery filter pipeline.
//!
//! A chain of independent, order-fixed transformations over the discovered
//! resource list: network match → has-description → protocol-version
//! allow-list → keyword match → price ceiling. Each filter is pure over its
//! inputs; the provider skips the keyword and price filters entirely when
//! the caller supplied no criterion for them.

use agentpay::WalletKind;
use agentpay_types::proto::DiscoveryResource;

use crate::format::{is_usdc_asset, whole_units_to_atomic};

/// Placeholder description some paygate middlewares emit; treated as absent.
const DEFAULT_DESCRIPTION: &str = "Access to protected content";

/// Keeps resources with at least one payment option on one of the wallet's
/// network identifiers (either x402 format).
pub fn filter_by_network(
    resources: Vec<DiscoveryResource>,
    wallet_networks: &[String],
) -> Vec<DiscoveryResource> {
    resources
        .into_iter()
        .filter(|resource| {
            resource
                .accepts
                .iter()
                .any(|option| wallet_networks.contains(&option.network))
        })
        .collect()
}

/// Drops resources with an empty or placeholder description.
pub fn filter_by_description(resources: Vec<DiscoveryResource>) -> Vec<DiscoveryResource> {
    resources
        .into_iter()
        .filter(|resource| {
            let description = resource.description();
            let trimmed = description.trim();
            !trimmed.is_empty() && trimmed != DEFAULT_DESCRIPTION
        })
        .collect()
}

/// Keeps resources whose protocol version is absent or in the allowed set.
pub fn filter_by_version(
    resources: Vec<DiscoveryResource>,
    allowed_versions: &[u8],
) -> Vec<DiscoveryResource> {
    resources
        .into_iter()
        .filter(|resource| match resource.x402_version {
            None => true,
            Some(version) => allowed_versions.contains(&version),
        })
        .collect()
}

/// Case-insensitive substring match against the version-appropriate
/// description or the resource URL.
pub fn filter_by_keyword(
    resources: Vec<DiscoveryResource>,
    keyword: &str,
) -> Vec<DiscoveryResource> {
    let needle = keyword.to_lowercase();
    resources
        .into_iter()
        .filter(|resource| {
            resource.description().to_lowercase().contains(&needle)
                || resource.url().to_lowercase().contains(&needle)
        })
        .collect()
}

/// Keeps resources with at least one USDC payment option on the wallet's
/// network whose amount does not exceed the ceiling.
///
/// Both the option amount and the ceiling are compared in atomic units;
/// options whose amounts fail to convert are excluded rather than failing
/// the filter.
pub async fn filter_by_max_price(
    resources: Vec<DiscoveryResource>,
    max_usdc_price: f64,
    wallet: &WalletKind,
    wallet_networks: &[String],
) -> Vec<DiscoveryResource> {
    let mut filtered = Vec::new();

    for resource in resources {
        let mut should_include = false;

        for option in &resource.accepts {
            if !wallet_networks.contains(&option.network) {
                continue;
            }
            if option.asset.is_empty() || !is_usdc_asset(&option.asset, wallet) {
                continue;
            }
            let Some(amount_str) = option.amount.as_deref() else {
                continue;
            };
            let Some(ceiling_atomic) =
                whole_units_to_atomic(max_usdc_price, &option.asset, wallet).await
            else {
                continue;
            };
            let (Ok(amount), Ok(ceiling)) =
                (amount_str.parse::<u128>(), ceiling_atomic.parse::<u128>())
            else {
                continue;
            };
            if amount <= ceiling {
                should_include = true;
                break;
            }
        }

        if should_include {
            filtered.push(resource);
        }
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::test_support::evm_wallet;

    const SEPOLIA_USDC: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

    fn resource(url: &str, network: &str, amount: &str, description: &str) -> DiscoveryResource {
        serde_json::from_value(serde_json::json!({
            "resource": url,
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": network,
                "asset": SEPOLIA_USDC,
                "maxAmountRequired": amount,
                "description": description
            }]
        }))
        .unwrap()
    }

    #[test]
    fn network_filter_matches_any_alias() {
        let resources = vec![resource(
            "https://a.example",
            "base-sepolia",
            "10000",
            "Paid API",
        )];

        // A mainnet wallet set excludes the sepolia-only resource.
        let mainnet_set = vec!["base".to_string(), "eip155:8453".to_string()];
        assert!(filter_by_network(resources.clone(), &mainnet_set).is_empty());

        // A set containing the testnet name includes it.
        let sepolia_set = vec!["base-sepolia".to_string(), "eip155:84532".to_string()];
        assert_eq!(filter_by_network(resources, &sepolia_set).len(), 1);
    }

    #[test]
    fn description_filter_drops_placeholder_and_blank() {
        let resources = vec![
            resource("https://a.example", "base", "1", "Access to protected content"),
            resource("https://b.example", "base", "1", "   "),
            resource("https://c.example", "base", "1", "Real description"),
        ];
        let kept = filter_by_description(resources);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url(), "https://c.example");
    }

    #[test]
    fn version_filter_keeps_untagged_resources() {
        let mut untagged = resource("https://a.example", "base", "1", "d");
        untagged.x402_version = None;
        let mut v2 = resource("https://b.example", "base", "1", "d");
        v2.x402_version = Some(2);

        let kept = filter_by_version(vec![untagged, v2], &[1]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url(), "https://a.example");
    }

    #[test]
    fn keyword_filter_matches_description_or_url() {
        let resources = vec![
            resource("https://weather.example", "base", "1", "Forecasts"),
            resource("https://b.example", "base", "1", "Weather alerts"),
            resource("https://c.example", "base", "1", "Stock quotes"),
        ];
        let kept = filter_by_keyword(resources, "WEATHER");
        assert_eq!(kept.len(), 2);
    }

    #[tokio::test]
    async fn price_filter_compares_atomic_amounts() {
        let wallet = evm_wallet("base-sepolia");
        let networks = vec!["base-sepolia".to_string(), "eip155:84532".to_string()];
        let resources = vec![
            resource("https://cheap.example", "base-sepolia", "10000", "d"), // 0.01 USDC
            resource("https://dear.example", "base-sepolia", "2000000", "d"), // 2 USDC
        ];

        let kept = filter_by_max_price(resources, 1.0, &wallet, &networks).await;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url(), "https://cheap.example");
    }

    #[tokio::test]
    async fn price_filter_is_idempotent() {
        let wallet = evm_wallet("base-sepolia");
        let networks = vec!["base-sepolia".to_string(), "eip155:84532".to_string()];
        let resources = vec![
            resource("https://cheap.example", "base-sepolia", "10000", "d"),
            resource("https://dear.example", "base-sepolia", "2000000", "d"),
        ];

        let once = filter_by_max_price(resources, 0.5, &wallet, &networks).await;
        let twice = filter_by_max_price(once.clone(), 0.5, &wallet, &networks).await;
        assert_eq!(
            once.iter().map(|r| r.url().to_string()).collect::<Vec<_>>(),
            twice.iter().map(|r| r.url().to_string()).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn price_filter_excludes_unconvertible_amounts() {
        let wallet = evm_wallet("base-sepolia");
        let networks = vec!["base-sepolia".to_string()];
        let resources = vec![resource(
            "https://odd.example",
            "base-sepolia",
            "$0.01",
            "d",
        )];
        let kept = filter_by_max_price(resources, 1.0, &wallet, &networks).await;
        assert!(kept.is_empty());
    }
}
