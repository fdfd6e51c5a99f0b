//! Validated, non-negative quantities (liters of milk, kilograms of cheese, ...).

use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A non-negative, finite amount.
///
/// Backed by `Decimal` so that applying a delta and retracting it restores the
/// balance exactly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::invalid_quantity(format!(
                "{value} is negative"
            )));
        }
        Ok(Self(value.normalize()))
    }

    /// Convert a raw form value. Rejects NaN, infinities and negatives.
    pub fn from_f64(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_quantity(format!("{value} is not finite")));
        }
        if value < 0.0 {
            return Err(DomainError::invalid_quantity(format!("{value} is negative")));
        }
        let decimal = Decimal::try_from(value)
            .map_err(|e| DomainError::invalid_quantity(format!("{value}: {e}")))?;
        Self::new(decimal)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Lossy conversion for display/reporting collaborators.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::MAX)
    }
}

impl ValueObject for Quantity {}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| DomainError::invalid_quantity(format!("{trimmed:?} is not a number")))?;
        Self::new(decimal)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(Decimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_positive_values() {
        assert!(Quantity::from_f64(0.0).unwrap().is_zero());
        assert_eq!(Quantity::from_f64(12.5).unwrap().as_decimal(), Decimal::new(125, 1));
        assert_eq!("30".parse::<Quantity>().unwrap(), Quantity::from(30));
    }

    #[test]
    fn negative_and_non_finite_values_are_invalid() {
        for raw in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            match Quantity::from_f64(raw) {
                Err(DomainError::InvalidQuantity(_)) => {}
                other => panic!("expected InvalidQuantity for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn non_numeric_text_is_invalid() {
        for raw in ["", "abc", "12kg", "-4"] {
            assert!(matches!(
                raw.parse::<Quantity>(),
                Err(DomainError::InvalidQuantity(_))
            ));
        }
    }

    #[test]
    fn scientific_notation_is_accepted() {
        assert_eq!("1e3".parse::<Quantity>().unwrap(), Quantity::from(1000));
    }

    #[test]
    fn deserialization_enforces_validation() {
        let ok: Quantity = serde_json::from_str("\"2.5\"").unwrap();
        assert_eq!(ok.as_decimal(), Decimal::new(25, 1));
        assert!(serde_json::from_str::<Quantity>("\"-2.5\"").is_err());
    }

    proptest::proptest! {
        #[test]
        fn sign_decides_validity(mantissa in -1_000_000_000i64..1_000_000_000, scale in 0u32..6) {
            let value = Decimal::new(mantissa, scale);
            let parsed = Quantity::new(value);
            proptest::prop_assert_eq!(parsed.is_ok(), mantissa >= 0);
            if let Ok(q) = parsed {
                proptest::prop_assert_eq!(q.as_decimal(), value);
            }
        }
    }
}
