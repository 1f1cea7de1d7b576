//! Currency amount parsing and token unit arithmetic.
//!
//! [`MoneyAmount`] parses human-readable prices such as `"$0.01"` into a
//! fixed-point decimal. [`TokenAmount`] holds an integer amount in a token's
//! smallest unit as a decimal digit string of arbitrary length, and compares
//! without ever going through floating point.
//!
//! ```rust
//! use s402::amount::{MoneyAmount, TokenAmount};
//!
//! let price = MoneyAmount::parse("$0.01").unwrap();
//! let units = price.to_token_units(6).unwrap();
//! assert_eq!(units.to_string(), "10000");
//! assert!(TokenAmount::from(10_000u64) >= units);
//! ```

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?([\d.]+)").expect("valid price pattern"));

const MAX_STR: &str = "999999999";

static MAX: LazyLock<Decimal> =
    LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));

/// A parsed, non-negative monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyAmount(Decimal);

/// Errors that can occur when parsing a monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoneyAmountParseError {
    /// The input string does not contain a number.
    #[error("Invalid number format")]
    InvalidFormat,
    /// The value is outside the allowed range.
    #[error("Amount must not exceed {MAX_STR}")]
    OutOfRange,
    /// Negative values are not allowed.
    #[error("Negative value is not allowed")]
    Negative,
}

impl MoneyAmount {
    /// Parses a price string such as `"$0.01"` or `"0.5"`.
    ///
    /// The first run of digits and dots, optionally preceded by `$`, is taken
    /// as the value. Anything around it (currency names, whitespace) is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyAmountParseError`] if no number is found, the number is
    /// malformed (e.g. `"1.2.3"`), the input is negative, or the value is too
    /// large.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let trimmed = input.trim_start();
        if trimmed.starts_with('-') || trimmed.starts_with("$-") {
            return Err(MoneyAmountParseError::Negative);
        }
        let digits = PRICE_PATTERN
            .captures(trimmed)
            .and_then(|captures| captures.get(1))
            .ok_or(MoneyAmountParseError::InvalidFormat)?;
        let parsed = Decimal::from_str(digits.as_str())
            .map_err(|_| MoneyAmountParseError::InvalidFormat)?;
        if parsed > *MAX {
            return Err(MoneyAmountParseError::OutOfRange);
        }
        Ok(Self(parsed))
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Converts to the smallest unit of a token with `decimals` places.
    ///
    /// Digits beyond the token's precision are truncated, never rounded:
    /// `"$0.0000019"` at 6 decimals is `1`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyAmountParseError::OutOfRange`] if the scaled value does
    /// not fit.
    pub fn to_token_units(&self, decimals: u8) -> Result<TokenAmount, MoneyAmountParseError> {
        let factor = 10u64
            .checked_pow(u32::from(decimals))
            .ok_or(MoneyAmountParseError::OutOfRange)?;
        let scaled = self
            .0
            .checked_mul(Decimal::from(factor))
            .ok_or(MoneyAmountParseError::OutOfRange)?
            .trunc();
        let units = scaled.to_u128().ok_or(MoneyAmountParseError::OutOfRange)?;
        Ok(TokenAmount::from(units))
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// A non-negative integer amount in a token's smallest unit.
///
/// Stored as canonical decimal digits (no sign, no leading zeros) so values
/// of any size compare exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenAmount(String);

/// The input is not a non-negative decimal integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not a non-negative integer amount: {0:?}")]
pub struct TokenAmountParseError(String);

impl TokenAmount {
    /// Returns the canonical digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TokenAmount {
    type Err = TokenAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TokenAmountParseError(s.to_owned()));
        }
        let canonical = s.trim_start_matches('0');
        if canonical.is_empty() {
            Ok(Self("0".to_owned()))
        } else {
            Ok(Self(canonical.to_owned()))
        }
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<u128> for TokenAmount {
    fn from(value: u128) -> Self {
        Self(value.to_string())
    }
}

impl Ord for TokenAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        // Canonical form: a longer digit string is always the larger number.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for TokenAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dollar_prices() {
        assert_eq!(MoneyAmount::parse("$0.01").unwrap().to_string(), "0.01");
        assert_eq!(MoneyAmount::parse("0.5").unwrap().to_string(), "0.5");
        assert_eq!(MoneyAmount::parse("$10 USDC").unwrap().to_string(), "10");
    }

    #[test]
    fn rejects_bad_prices() {
        assert_eq!(
            MoneyAmount::parse("free"),
            Err(MoneyAmountParseError::InvalidFormat)
        );
        assert_eq!(
            MoneyAmount::parse("$1.2.3"),
            Err(MoneyAmountParseError::InvalidFormat)
        );
        assert_eq!(
            MoneyAmount::parse("-$1"),
            Err(MoneyAmountParseError::Negative)
        );
        assert_eq!(
            MoneyAmount::parse("$-1"),
            Err(MoneyAmountParseError::Negative)
        );
        assert_eq!(
            MoneyAmount::parse("$1000000000"),
            Err(MoneyAmountParseError::OutOfRange)
        );
    }

    #[test]
    fn one_cent_is_ten_thousand_micro_units() {
        let units = MoneyAmount::parse("$0.01").unwrap().to_token_units(6).unwrap();
        assert_eq!(units.as_str(), "10000");
    }

    #[test]
    fn token_conversion_truncates() {
        let units = MoneyAmount::parse("$0.0000019")
            .unwrap()
            .to_token_units(6)
            .unwrap();
        assert_eq!(units.as_str(), "1");
        let units = MoneyAmount::parse("$0.0000009")
            .unwrap()
            .to_token_units(6)
            .unwrap();
        assert_eq!(units.as_str(), "0");
    }

    #[test]
    fn token_amounts_compare_numerically() {
        let small: TokenAmount = "9999".parse().unwrap();
        let big: TokenAmount = "10000".parse().unwrap();
        assert!(small < big);
        assert_eq!("0010000".parse::<TokenAmount>().unwrap(), big);
        assert_eq!("000".parse::<TokenAmount>().unwrap().as_str(), "0");

        let huge: TokenAmount = "340282366920938463463374607431768211456000".parse().unwrap();
        assert!(TokenAmount::from(u64::MAX) < huge);
        assert!(TokenAmount::from(u128::MAX) < huge);
    }

    #[test]
    fn token_amount_rejects_non_digits() {
        assert!("".parse::<TokenAmount>().is_err());
        assert!("-1".parse::<TokenAmount>().is_err());
        assert!("1.5".parse::<TokenAmount>().is_err());
        assert!("1e6".parse::<TokenAmount>().is_err());
        assert!(" 1".parse::<TokenAmount>().is_err());
    }
}
