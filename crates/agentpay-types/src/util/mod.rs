//! Helper types shared across the providers.

mod b64;
mod units;

pub use b64::Base64Bytes;
pub use units::{MoneyAmount, MoneyAmountParseError, format_units, parse_units};
