//! Fixed-Point Money and Multipliers
//!
//! All wager arithmetic uses integers only - no floats touch a payout.
//!
//! ## Formats
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Amount      u128, 18 decimal places (1 MON = 10^18 units)  │
//! │  Multiplier  u64, hundredths          (2.10x = 210)         │
//! │  Basis point u32, ten-thousandths     (1% = 100 bps)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Amount * Multiplier` stays in `u128`: 10^19 units times a multiplier
//! capped at 10^8 hundredths is far below `u128::MAX`. Products are
//! floored to the smallest unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places carried by [`Amount`].
pub const AMOUNT_DECIMALS: u32 = 18;

/// One whole currency unit (10^18).
pub const AMOUNT_ONE: u128 = 1_000_000_000_000_000_000;

/// Multiplier scale: 100 = 1.00x.
pub const MULTIPLIER_SCALE: u64 = 100;

/// Basis-point scale: 10_000 = 100%.
pub const BASIS_POINTS: u32 = 10_000;

/// Errors from parsing or combining fixed-point values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedError {
    /// Input was not a plain non-negative decimal number.
    #[error("invalid decimal: {0:?}")]
    InvalidDecimal(String),

    /// More fractional digits than the type can represent.
    #[error("too many decimal places in {input:?} (max {max})")]
    TooPrecise {
        /// Offending input.
        input: String,
        /// Maximum fractional digits.
        max: u32,
    },

    /// Value does not fit the underlying integer.
    #[error("value out of range: {0:?}")]
    OutOfRange(String),

    /// Arithmetic overflowed.
    #[error("arithmetic overflow")]
    Overflow,
}

// =============================================================================
// AMOUNT
// =============================================================================

/// A currency amount with 18 decimal places.
///
/// Serialized as a decimal string (`"0.1"`) so JSON clients never see
/// a lossy float.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// Zero.
    pub const ZERO: Amount = Amount(0);

    /// Create from smallest units.
    pub const fn from_units(units: u128) -> Self {
        Self(units)
    }

    /// Create from whole currency units.
    pub const fn from_whole(whole: u64) -> Self {
        Self(whole as u128 * AMOUNT_ONE)
    }

    /// Raw smallest units.
    pub const fn units(self) -> u128 {
        self.0
    }

    /// Is this exactly zero?
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiply by a multiplier, flooring to the smallest unit.
    pub fn checked_mul_multiplier(self, multiplier: Multiplier) -> Result<Amount, FixedError> {
        self.0
            .checked_mul(multiplier.hundredths() as u128)
            .map(|wide| Amount(wide / MULTIPLIER_SCALE as u128))
            .ok_or(FixedError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_decimal(self.0, AMOUNT_DECIMALS))
    }
}

impl FromStr for Amount {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s, AMOUNT_DECIMALS).map(Amount)
    }
}

impl TryFrom<String> for Amount {
    type Error = FixedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_string()
    }
}

// =============================================================================
// MULTIPLIER
// =============================================================================

/// A payout multiplier in hundredths (`Multiplier::from_hundredths(250)` is 2.50x).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Multiplier(u64);

impl Multiplier {
    /// 0.00x - a losing bet.
    pub const ZERO: Multiplier = Multiplier(0);

    /// 1.00x - the floor of every crash point.
    pub const ONE: Multiplier = Multiplier(MULTIPLIER_SCALE);

    /// Create from hundredths.
    pub const fn from_hundredths(hundredths: u64) -> Self {
        Self(hundredths)
    }

    /// Raw hundredths.
    pub const fn hundredths(self) -> u64 {
        self.0
    }

    /// Float view for logs and display only.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / MULTIPLIER_SCALE as f64
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / MULTIPLIER_SCALE, self.0 % MULTIPLIER_SCALE)
    }
}

impl FromStr for Multiplier {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix('x').unwrap_or(s);
        let value = parse_decimal(trimmed, 2)?;
        u64::try_from(value)
            .map(Multiplier)
            .map_err(|_| FixedError::OutOfRange(s.to_string()))
    }
}

impl TryFrom<String> for Multiplier {
    type Error = FixedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Multiplier> for String {
    fn from(value: Multiplier) -> Self {
        value.to_string()
    }
}

// =============================================================================
// DECIMAL CODEC
// =============================================================================

/// Parse a non-negative decimal string into an integer scaled by `10^decimals`.
///
/// Rejects signs, exponents and anything beyond `decimals` fractional digits
/// (no silent rounding of money).
pub fn parse_decimal(s: &str, decimals: u32) -> Result<u128, FixedError> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
        return Err(FixedError::InvalidDecimal(s.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(FixedError::TooPrecise { input: s.to_string(), max: decimals });
    }

    let scale = 10u128.pow(decimals);
    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| FixedError::OutOfRange(s.to_string()))?
    };

    let mut frac_value: u128 = 0;
    for digit in frac.bytes() {
        frac_value = frac_value * 10 + (digit - b'0') as u128;
    }
    frac_value *= 10u128.pow(decimals - frac.len() as u32);

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| FixedError::OutOfRange(s.to_string()))
}

/// Format a scaled integer as a decimal string, trimming trailing zeros.
pub fn format_decimal(value: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        let amount: Amount = "0.1".parse().unwrap();
        assert_eq!(amount.units(), AMOUNT_ONE / 10);

        let amount: Amount = "2".parse().unwrap();
        assert_eq!(amount, Amount::from_whole(2));

        let amount: Amount = ".5".parse().unwrap();
        assert_eq!(amount.units(), AMOUNT_ONE / 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Amount>().is_err());
        assert!("-1".parse::<Amount>().is_err());
        assert!("1e3".parse::<Amount>().is_err());
        assert!("1.2.3".parse::<Amount>().is_err());
        assert!(matches!(
            "0.0000000000000000001".parse::<Amount>(),
            Err(FixedError::TooPrecise { .. })
        ));
    }

    #[test]
    fn test_amount_display_trims() {
        assert_eq!(Amount::from_units(AMOUNT_ONE / 5).to_string(), "0.2");
        assert_eq!(Amount::from_whole(10).to_string(), "10");
        assert_eq!(Amount::ZERO.to_string(), "0");
        assert_eq!(Amount::from_units(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_multiplier_display_and_parse() {
        let m = Multiplier::from_hundredths(210);
        assert_eq!(m.to_string(), "2.10");
        assert_eq!("2.1".parse::<Multiplier>().unwrap(), m);
        assert_eq!("2.10x".parse::<Multiplier>().unwrap(), m);
        assert!("2.105".parse::<Multiplier>().is_err());
    }

    #[test]
    fn test_amount_times_multiplier() {
        let bet: Amount = "0.1".parse().unwrap();
        let payout = bet.checked_mul_multiplier(Multiplier::from_hundredths(200)).unwrap();
        assert_eq!(payout, "0.2".parse().unwrap());

        let payout = bet.checked_mul_multiplier(Multiplier::from_hundredths(210)).unwrap();
        assert_eq!(payout, "0.21".parse().unwrap());

        let payout = bet.checked_mul_multiplier(Multiplier::ZERO).unwrap();
        assert!(payout.is_zero());
    }

    #[test]
    fn test_multiplication_floors() {
        // 3 units * 0.25x = 0.75 units -> floored to 0
        let tiny = Amount::from_units(3);
        let payout = tiny.checked_mul_multiplier(Multiplier::from_hundredths(25)).unwrap();
        assert_eq!(payout.units(), 0);
    }

    #[test]
    fn test_overflow_is_reported() {
        let huge = Amount::from_units(u128::MAX / 2);
        assert_eq!(
            huge.checked_mul_multiplier(Multiplier::from_hundredths(1_000)),
            Err(FixedError::Overflow)
        );
    }

    #[test]
    fn test_serde_as_string() {
        let amount: Amount = "1.25".parse().unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1.25\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);

        let m: Multiplier = serde_json::from_str("\"4.23\"").unwrap();
        assert_eq!(m.hundredths(), 423);
    }
}
