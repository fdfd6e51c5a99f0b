//! Signed stock deltas and how recorder input is converted into them.

use core::ops::Neg;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dairyledger_catalog::Product;
use dairyledger_core::{DomainError, DomainResult, Quantity, ValueObject};

/// A signed change to a product's balance.
///
/// Positive for production, negative for sales.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(Decimal);

impl Delta {
    pub const ZERO: Delta = Delta(Decimal::ZERO);

    /// Stock increase from a production run.
    pub fn production(quantity: Quantity) -> Self {
        Self(quantity.as_decimal())
    }

    /// Stock decrease from a sale.
    pub fn sale(quantity: Quantity) -> Self {
        Self(-quantity.as_decimal())
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// True when applying this delta lowers the balance.
    pub fn is_consumption(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute size of the change.
    pub fn magnitude(&self) -> Decimal {
        self.0.abs()
    }

    /// `self - rhs`; `InvalidQuantity` when the difference is out of range.
    pub fn checked_sub(self, rhs: Delta) -> DomainResult<Delta> {
        self.0.checked_sub(rhs.0).map(Delta).ok_or_else(|| {
            DomainError::invalid_quantity(format!("{self} minus {rhs} is out of range"))
        })
    }
}

impl ValueObject for Delta {}

impl Neg for Delta {
    type Output = Delta;

    fn neg(self) -> Self::Output {
        Delta(-self.0)
    }
}

impl core::fmt::Display for Delta {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.0.is_sign_negative() || self.0.is_zero() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "+{}", self.0)
        }
    }
}

/// Decimal places kept on derived production quantities.
///
/// Bounding the scale keeps every balance addition exact, so retracting a stored
/// delta restores the previous balance to the last digit.
pub const PRODUCED_QUANTITY_SCALE: u32 = 6;

/// Result of converting milk into product.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProductionDelta {
    pub quantity_produced: Quantity,
    pub delta: Delta,
}

/// Liters of milk per produced unit; a missing or zero ratio is 1:1.
pub fn effective_ratio(ratio_to_milk: Option<Quantity>) -> Decimal {
    match ratio_to_milk {
        Some(ratio) if !ratio.is_zero() => ratio.as_decimal(),
        _ => Decimal::ONE,
    }
}

/// `quantity_produced = milk_used / effective_ratio`, rounded to
/// [`PRODUCED_QUANTITY_SCALE`] places, as a positive delta.
///
/// Uses the product's *current* ratio; callers store the result on the entry so
/// it is never recomputed.
pub fn compute_production_delta(product: &Product, milk_used: Quantity) -> DomainResult<ProductionDelta> {
    let ratio = effective_ratio(product.ratio_to_milk());
    let produced = milk_used
        .as_decimal()
        .checked_div(ratio)
        .ok_or_else(|| {
            DomainError::invalid_quantity(format!(
                "{milk_used} liters at ratio {ratio} is out of range"
            ))
        })?;
    let quantity_produced = Quantity::new(produced.round_dp(PRODUCED_QUANTITY_SCALE))?;

    tracing::debug!(
        product_id = %product.id_typed(),
        %milk_used,
        %ratio,
        %quantity_produced,
        "derived production quantity"
    );

    Ok(ProductionDelta {
        quantity_produced,
        delta: Delta::production(quantity_produced),
    })
}

/// A sale consumes exactly the sold quantity.
pub fn compute_sale_delta(quantity: Quantity) -> Delta {
    Delta::sale(quantity)
}
