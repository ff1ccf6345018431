//! Type-safe price representation using decimal arithmetic.
//!
//! FreshBasket sells in a single currency, Indian rupees, and quotes prices
//! in whole rupees with an optional paise fraction (`25`, `12.50`). Amounts
//! are never negative; the catalog boundary coerces anything unusable to
//! zero via [`Price::lenient`] so aggregation code never has to.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from whole rupees.
    ///
    /// Negative input is clamped to zero.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees.max(0)))
    }

    /// Coerce an optional raw amount into a price.
    ///
    /// Missing and negative amounts become [`Price::ZERO`].
    #[must_use]
    pub fn lenient(amount: Option<Decimal>) -> Self {
        amount.and_then(|a| Self::new(a).ok()).unwrap_or(Self::ZERO)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this is a zero price.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Price multiplied by a quantity, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self, quantity: u32) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity))
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_rupees(self.0))
    }
}

/// Format a rupee amount for display.
///
/// Whole amounts print without a fraction, anything else with two decimal
/// places, and the integer part is grouped in thousands:
///
/// ```
/// use freshbasket_core::format_rupees;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_rupees(Decimal::from(50)), "₹50");
/// assert_eq!(format_rupees(Decimal::from(1250)), "₹1,250");
/// assert_eq!(format_rupees(Decimal::new(1250, 2)), "₹12.50");
/// ```
#[must_use]
pub fn format_rupees(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let amount = amount.abs().round_dp(2);
    let whole = amount.trunc();
    let fraction = amount - whole;

    let digits = whole.normalize().to_string();
    let grouped = group_thousands(&digits);

    if fraction.is_zero() {
        format!("{sign}₹{grouped}")
    } else {
        let paise = (fraction * Decimal::ONE_HUNDRED).trunc().to_u32().unwrap_or(0);
        format!("{sign}₹{grouped}.{paise:02}")
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::from(-1)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert!(Price::new(Decimal::new(2550, 2)).is_ok());
    }

    #[test]
    fn test_lenient_coerces_to_zero() {
        assert_eq!(Price::lenient(None), Price::ZERO);
        assert_eq!(Price::lenient(Some(Decimal::from(-5))), Price::ZERO);
        assert_eq!(
            Price::lenient(Some(Decimal::from(25))),
            Price::from_rupees(25)
        );
    }

    #[test]
    fn test_line_total() {
        let price = Price::new(Decimal::new(1250, 2)).unwrap();
        assert_eq!(price.line_total(3), Decimal::new(3750, 2));
        assert_eq!(price.line_total(0), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_saturates() {
        let price = Price::new(Decimal::MAX).unwrap();
        assert_eq!(price.line_total(1), Decimal::MAX);
        assert_eq!(price.line_total(u32::MAX), Decimal::MAX);
        assert_eq!(format_rupees(Decimal::MAX).chars().next(), Some('₹'));
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(Decimal::ZERO), "₹0");
        assert_eq!(format_rupees(Decimal::from(999)), "₹999");
        assert_eq!(format_rupees(Decimal::from(1000)), "₹1,000");
        assert_eq!(format_rupees(Decimal::from(1_234_567)), "₹1,234,567");
        assert_eq!(format_rupees(Decimal::new(505, 1)), "₹50.50");
        assert_eq!(format_rupees(Decimal::new(10005, 2)), "₹100.05");
        assert_eq!(format_rupees(Decimal::new(2500, 2)), "₹25");
    }

    #[test]
    fn test_deserialize_accepts_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("25").unwrap();
        let from_string: Price = serde_json::from_str("\"25\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<Price>("-3").is_err());
    }
}
