//! Payment-option formatting and unit conversion.
//!
//! Rendering consults the static asset registry first and falls back to an
//! on-chain metadata read for EVM wallets; every failure along the way
//! degrades to printing the raw asset identifier and amount. These
//! functions never error: a price the agent cannot decode is still better
//! reported verbatim than dropped.

use agentpay::WalletKind;
use agentpay_types::assets;
use agentpay_types::networks;
use agentpay_types::proto::{DiscoveryResource, SimplifiedResource};
use agentpay_types::util::{MoneyAmount, format_units};

/// The `(asset, amount, network)` triple the formatter renders.
#[derive(Debug, Clone)]
pub struct FormatOption<'a> {
    pub asset: &'a str,
    pub amount: &'a str,
    pub network: &'a str,
}

/// Renders a payment option as `"<decimal-amount> <SYMBOL> on <network>"`,
/// e.g. `"0.01 USDC on base-mainnet"`.
pub async fn format_payment_option(option: FormatOption<'_>, wallet: &WalletKind) -> String {
    let network_label = networks::network_id_for_alias(option.network);
    let raw = || format!("{} {} on {}", option.asset, option.amount, network_label);

    let Ok(amount) = option.amount.parse::<u128>() else {
        return raw();
    };
    let wallet_network = wallet.network();
    let Some(network_id) = wallet_network.network_id.as_deref() else {
        return raw();
    };

    if let Some(info) = assets::by_address(network_id, option.asset) {
        return format!(
            "{} {} on {}",
            format_units(amount, info.decimals as u32),
            info.symbol,
            network_label
        );
    }

    if let Some(evm) = wallet.as_evm() {
        if let Ok(details) = evm.token_details(option.asset).await {
            return format!(
                "{} {} on {}",
                format_units(amount, details.decimals as u32),
                details.name,
                network_label
            );
        }
    }

    raw()
}

/// Whether `asset` is the USDC deployment on the wallet's network.
pub fn is_usdc_asset(asset: &str, wallet: &WalletKind) -> bool {
    let network = wallet.network();
    let Some(network_id) = network.network_id.as_deref() else {
        return false;
    };
    assets::usdc(network_id)
        .map(|usdc| usdc.matches_address(asset))
        .unwrap_or(false)
}

/// Converts a whole-unit amount to atomic units for the given asset,
/// following the same registry-then-chain-read policy as the formatter and
/// defaulting to 18 decimals when nothing resolves. `None` only on
/// arithmetic overflow or an unrepresentable input.
pub async fn whole_units_to_atomic(
    whole_units: f64,
    asset: &str,
    wallet: &WalletKind,
) -> Option<String> {
    let amount = MoneyAmount::try_from(whole_units).ok()?;
    let network = wallet.network();
    let network_id = network.network_id.as_deref().unwrap_or_default();

    if let Some(info) = assets::by_address(network_id, asset) {
        return amount.to_atomic(info.decimals as u32);
    }

    if let Some(evm) = wallet.as_evm() {
        if let Ok(details) = evm.token_details(asset).await {
            return amount.to_atomic(details.decimals as u32);
        }
    }

    amount.to_atomic(18)
}

/// Projects filtered resources into the simplified presentation form: URL,
/// formatted price for the first wallet-compatible option, description.
pub async fn simplified_resources(
    resources: &[DiscoveryResource],
    wallet_networks: &[String],
    wallet: &WalletKind,
) -> Vec<SimplifiedResource> {
    let mut simplified = Vec::new();

    for resource in resources {
        let Some(option) = resource
            .accepts
            .iter()
            .find(|option| wallet_networks.contains(&option.network))
        else {
            continue;
        };

        let price = match option.amount.as_deref() {
            Some(amount) if !option.asset.is_empty() => {
                format_payment_option(
                    FormatOption {
                        asset: &option.asset,
                        amount,
                        network: &option.network,
                    },
                    wallet,
                )
                .await
            }
            _ => "Unknown".to_string(),
        };

        simplified.push(SimplifiedResource {
            url: resource.url().to_string(),
            price,
            description: resource.description(),
        });
    }

    simplified
}


#[cfg(test)]
mod tests {
    use super::test_support::{evm_wallet, svm_wallet};
    use super::*;

    const BASE_USDC: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";

    #[tokio::test]
    async fn formats_known_usdc() {
        let wallet = evm_wallet("base-mainnet");
        let rendered = format_payment_option(
            FormatOption {
                asset: BASE_USDC,
                amount: "1000000",
                network: "base",
            },
            &wallet,
        )
        .await;
        assert!(rendered.contains("1 USDC on base"), "got: {rendered}");
    }

    #[tokio::test]
    async fn unknown_asset_degrades_to_raw() {
        let wallet = evm_wallet("base-mainnet");
        let rendered = format_payment_option(
            FormatOption {
                asset: "0x00000000000000000000000000000000DeaDBeef",
                amount: "123456",
                network: "some-other-net",
            },
            &wallet,
        )
        .await;
        assert!(rendered.contains("0x00000000000000000000000000000000DeaDBeef"));
        assert!(rendered.contains("123456"));
        assert!(rendered.contains("some-other-net"));
    }

    #[tokio::test]
    async fn unparseable_amount_degrades_to_raw() {
        let wallet = evm_wallet("base-mainnet");
        let rendered = format_payment_option(
            FormatOption {
                asset: BASE_USDC,
                amount: "$0.01",
                network: "base",
            },
            &wallet,
        )
        .await;
        assert!(rendered.contains("$0.01"));
    }

    #[tokio::test]
    async fn solana_usdc_uses_registry() {
        let wallet = svm_wallet("solana-mainnet");
        let rendered = format_payment_option(
            FormatOption {
                asset: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                amount: "2500000",
                network: "solana",
            },
            &wallet,
        )
        .await;
        assert!(rendered.contains("2.5 USDC on solana"), "got: {rendered}");
    }

    #[test]
    fn usdc_detection_per_wallet_network() {
        let wallet = evm_wallet("base-sepolia");
        assert!(is_usdc_asset(
            "0x036cbd53842c5426634e7929541ec2318f3dcf7e",
            &wallet
        ));
        assert!(!is_usdc_asset(BASE_USDC, &wallet));

        let sol = svm_wallet("solana-devnet");
        assert!(is_usdc_asset(
            "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
            &sol
        ));
    }

    #[tokio::test]
    async fn whole_units_conversion_policy() {
        let wallet = evm_wallet("base-mainnet");
        // Registry hit: USDC has 6 decimals.
        assert_eq!(
            whole_units_to_atomic(0.5, BASE_USDC, &wallet).await.unwrap(),
            "500000"
        );
        // Unknown asset, chain read fails: default 18 decimals.
        assert_eq!(
            whole_units_to_atomic(1.0, "0x00000000000000000000000000000000DeaDBeef", &wallet)
                .await
                .unwrap(),
            "1000000000000000000"
        );
    }
}
