//! Immutable ledger entries: production runs and sales.
//!
//! An entry stores the delta it applied at the time it was recorded. Edits and
//! deletions retract that stored delta; they never recompute it from the catalog.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dairyledger_catalog::Product;
use dairyledger_core::{
    CustomerId, DomainError, DomainResult, EmployeeId, Entity, EntryId, ProductId, Quantity,
    ShopId,
};

use crate::delta::{Delta, compute_production_delta, compute_sale_delta};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Production,
    Sale,
}

/// Validated production form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionInput {
    pub product_id: ProductId,
    pub milk_used_liters: Quantity,
    pub produced_by: Option<EmployeeId>,
    pub date: NaiveDate,
}

/// Validated sale form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleInput {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub customer_id: CustomerId,
    pub shop_id: ShopId,
    /// Informational only; never used in balance logic.
    pub total_price: Decimal,
    pub date: NaiveDate,
}

/// Entry: a production run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionEntry {
    pub id: EntryId,
    pub product_id: ProductId,
    pub milk_used_liters: Quantity,
    pub quantity_produced: Quantity,
    pub produced_by: Option<EmployeeId>,
    pub date: NaiveDate,
}

impl ProductionEntry {
    /// Derive an entry from form input using the product's current ratio.
    pub fn derive(id: EntryId, product: &Product, input: ProductionInput) -> DomainResult<Self> {
        ensure_product(product, input.product_id)?;
        let produced = compute_production_delta(product, input.milk_used_liters)?;

        Ok(Self {
            id,
            product_id: input.product_id,
            milk_used_liters: input.milk_used_liters,
            quantity_produced: produced.quantity_produced,
            produced_by: input.produced_by,
            date: input.date,
        })
    }

    pub fn delta(&self) -> Delta {
        Delta::production(self.quantity_produced)
    }
}

impl Entity for ProductionEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Entry: a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEntry {
    pub id: EntryId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub customer_id: CustomerId,
    pub shop_id: ShopId,
    pub total_price: Decimal,
    pub date: NaiveDate,
}

impl SaleEntry {
    pub fn derive(id: EntryId, input: SaleInput) -> DomainResult<Self> {
        if input.total_price.is_sign_negative() && !input.total_price.is_zero() {
            return Err(DomainError::validation("total price cannot be negative"));
        }

        Ok(Self {
            id,
            product_id: input.product_id,
            quantity: input.quantity,
            customer_id: input.customer_id,
            shop_id: input.shop_id,
            total_price: input.total_price,
            date: input.date,
        })
    }

    pub fn delta(&self) -> Delta {
        compute_sale_delta(self.quantity)
    }
}

impl Entity for SaleEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Either kind of stock-affecting entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LedgerEntry {
    Production(ProductionEntry),
    Sale(SaleEntry),
}

impl LedgerEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            LedgerEntry::Production(_) => EntryKind::Production,
            LedgerEntry::Sale(_) => EntryKind::Sale,
        }
    }

    pub fn entry_id(&self) -> EntryId {
        match self {
            LedgerEntry::Production(e) => e.id,
            LedgerEntry::Sale(e) => e.id,
        }
    }

    pub fn product_id(&self) -> ProductId {
        match self {
            LedgerEntry::Production(e) => e.product_id,
            LedgerEntry::Sale(e) => e.product_id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            LedgerEntry::Production(e) => e.date,
            LedgerEntry::Sale(e) => e.date,
        }
    }

    pub fn delta(&self) -> Delta {
        match self {
            LedgerEntry::Production(e) => e.delta(),
            LedgerEntry::Sale(e) => e.delta(),
        }
    }
}

impl From<ProductionEntry> for LedgerEntry {
    fn from(value: ProductionEntry) -> Self {
        LedgerEntry::Production(value)
    }
}

impl From<SaleEntry> for LedgerEntry {
    fn from(value: SaleEntry) -> Self {
        LedgerEntry::Sale(value)
    }
}

fn ensure_product(product: &Product, product_id: ProductId) -> DomainResult<()> {
    if product.id_typed() != product_id {
        return Err(DomainError::validation("product_id mismatch"));
    }
    Ok(())
}
