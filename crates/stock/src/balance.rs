use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dairyledger_core::ProductId;

/// On-hand quantity of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub product_id: ProductId,
    pub current_quantity: Decimal,
    /// Date of the last mutation; `None` when no row exists for the product.
    pub last_updated: Option<NaiveDate>,
}

impl Balance {
    /// The balance reported for a product that has no stock row.
    pub fn absent(product_id: ProductId) -> Self {
        Self {
            product_id,
            current_quantity: Decimal::ZERO,
            last_updated: None,
        }
    }

    /// The row created alongside a new product.
    pub fn initial(product_id: ProductId, date: NaiveDate) -> Self {
        Self {
            product_id,
            current_quantity: Decimal::ZERO,
            last_updated: Some(date),
        }
    }

    pub fn exists(&self) -> bool {
        self.last_updated.is_some()
    }
}
