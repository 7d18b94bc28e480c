//! Token-unit conversion and human-readable amount parsing.
//!
//! Atomic amounts (the smallest indivisible token unit) travel on the wire
//! as integer strings; humans enter whole units ("0.1 USDC") or price
//! strings ("$0.01"). [`format_units`] and [`MoneyAmount::to_atomic`]
//! convert between the two given a token's decimal count.

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// Formats an atomic amount as a decimal string, trimming trailing zeros.
///
/// ```
/// use agentpay_types::util::format_units;
///
/// assert_eq!(format_units(1_000_000, 6), "1");
/// assert_eq!(format_units(1_500_000, 6), "1.5");
/// assert_eq!(format_units(10_000, 6), "0.01");
/// assert_eq!(format_units(42, 0), "42");
/// ```
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let divisor = 10u128.pow(decimals);
    let whole = value / divisor;
    let remainder = value % divisor;
    if remainder == 0 {
        return whole.to_string();
    }
    let mut frac = format!("{remainder:0width$}", width = decimals as usize);
    while frac.ends_with('0') {
        frac.pop();
    }
    format!("{whole}.{frac}")
}

/// Converts a whole-unit decimal amount into an atomic-unit integer string,
/// truncating any precision beyond the token's decimals.
pub fn parse_units(value: &Decimal, decimals: u32) -> Option<String> {
    let multiplier = Decimal::from(10u64.checked_pow(decimals)?);
    let atomic = value.checked_mul(multiplier)?.trunc();
    atomic.to_u128().map(|v| v.to_string())
}

/// A non-negative monetary amount parsed from human input.
///
/// Accepts plain numbers (`"0.01"`), currency symbols (`"$10.50"`), and
/// thousand separators (`"1,000"`). x402 V2 payment options may carry a
/// `price` field in this form.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyAmount(pub Decimal);

/// Errors that can occur when parsing a monetary amount.
#[derive(Debug, thiserror::Error)]
pub enum MoneyAmountParseError {
    /// The input string could not be parsed as a number.
    #[error("Invalid number format")]
    InvalidFormat,
    /// The value is outside the allowed range.
    #[error("Amount must be between 0 and {}", MAX_STR)]
    OutOfRange,
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
}

const MAX_STR: &str = "999999999";

static MAX: LazyLock<Decimal> =
    LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));

static CLEANUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d\.\-]+").expect("valid regex"));

impl MoneyAmount {
    /// Parses a human-readable currency string, stripping currency symbols,
    /// separators, and whitespace.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let cleaned = CLEANUP.replace_all(input, "");
        let parsed =
            Decimal::from_str(&cleaned).map_err(|_| MoneyAmountParseError::InvalidFormat)?;
        Self::checked(parsed)
    }

    fn checked(value: Decimal) -> Result<Self, MoneyAmountParseError> {
        if value.is_sign_negative() {
            return Err(MoneyAmountParseError::Negative);
        }
        if value > *MAX {
            return Err(MoneyAmountParseError::OutOfRange);
        }
        Ok(MoneyAmount(value))
    }

    /// Converts to an atomic-unit integer string for a token with the given
    /// decimal count. Returns `None` on overflow.
    pub fn to_atomic(&self, decimals: u32) -> Option<String> {
        parse_units(&self.0, decimals)
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl TryFrom<&str> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MoneyAmount::from_str(value)
    }
}

impl TryFrom<f64> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let decimal = Decimal::from_f64(value).ok_or(MoneyAmountParseError::OutOfRange)?;
        Self::checked(decimal)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_atomic_units() {
        assert_eq!(format_units(0, 6), "0");
        assert_eq!(format_units(1, 6), "0.000001");
        assert_eq!(format_units(1_000_000, 6), "1");
        assert_eq!(format_units(1_230_000, 6), "1.23");
        assert_eq!(format_units(1_000_000_000_000_000_000, 18), "1");
    }

    #[test]
    fn parses_price_strings() {
        assert_eq!(MoneyAmount::parse("$0.01").unwrap().to_string(), "0.01");
        assert_eq!(MoneyAmount::parse("1,000").unwrap().to_string(), "1000");
        assert!(MoneyAmount::parse("-1").is_err());
        assert!(MoneyAmount::parse("abc").is_err());
    }

    #[test]
    fn converts_to_atomic() {
        let amount = MoneyAmount::try_from(0.1).unwrap();
        assert_eq!(amount.to_atomic(6).unwrap(), "100000");
        let amount = MoneyAmount::try_from(1.0).unwrap();
        assert_eq!(amount.to_atomic(18).unwrap(), "1000000000000000000");
        // Precision beyond the token's decimals truncates.
        let amount = MoneyAmount::parse("0.0000015").unwrap();
        assert_eq!(amount.to_atomic(6).unwrap(), "1");
    }

    #[test]
    fn zero_is_allowed() {
        let amount = MoneyAmount::try_from(0.0).unwrap();
        assert_eq!(amount.to_atomic(6).unwrap(), "0");
    }
}
