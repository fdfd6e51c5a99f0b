use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dairyledger_core::{EntryId, ProductId};
use dairyledger_events::Event;

use crate::delta::Delta;
use crate::entry::{ProductionEntry, SaleEntry};

/// Published after a catalog or ledger change has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    ProductCreated {
        product_id: ProductId,
        occurred_on: NaiveDate,
    },
    ProductDeleted {
        product_id: ProductId,
        /// Balance discarded along with the product.
        final_quantity: Decimal,
        occurred_on: NaiveDate,
    },
    ProductionRecorded {
        entry: ProductionEntry,
        balance_after: Decimal,
    },
    ProductionRevised {
        previous: ProductionEntry,
        entry: ProductionEntry,
        balance_after: Decimal,
    },
    ProductionDeleted {
        entry_id: EntryId,
        product_id: ProductId,
        retracted: Delta,
        balance_after: Decimal,
        occurred_on: NaiveDate,
    },
    SaleRecorded {
        entry: SaleEntry,
        balance_after: Decimal,
    },
    SaleRevised {
        previous: SaleEntry,
        entry: SaleEntry,
        balance_after: Decimal,
    },
    SaleDeleted {
        entry_id: EntryId,
        product_id: ProductId,
        retracted: Delta,
        balance_after: Decimal,
        occurred_on: NaiveDate,
    },
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::ProductCreated { .. } => "product.created",
            LedgerEvent::ProductDeleted { .. } => "product.deleted",
            LedgerEvent::ProductionRecorded { .. } => "production.recorded",
            LedgerEvent::ProductionRevised { .. } => "production.revised",
            LedgerEvent::ProductionDeleted { .. } => "production.deleted",
            LedgerEvent::SaleRecorded { .. } => "sale.recorded",
            LedgerEvent::SaleRevised { .. } => "sale.revised",
            LedgerEvent::SaleDeleted { .. } => "sale.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_on(&self) -> NaiveDate {
        match self {
            LedgerEvent::ProductCreated { occurred_on, .. }
            | LedgerEvent::ProductDeleted { occurred_on, .. }
            | LedgerEvent::ProductionDeleted { occurred_on, .. }
            | LedgerEvent::SaleDeleted { occurred_on, .. } => *occurred_on,
            LedgerEvent::ProductionRecorded { entry, .. }
            | LedgerEvent::ProductionRevised { entry, .. } => entry.date,
            LedgerEvent::SaleRecorded { entry, .. } | LedgerEvent::SaleRevised { entry, .. } => {
                entry.date
            }
        }
    }
}
