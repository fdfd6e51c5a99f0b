use chrono::NaiveDate;

use dairyledger_core::{DomainError, DomainResult, EntryId};
use dairyledger_events::EventBus;
use dairyledger_ledger::{LedgerEvent, SaleEntry, SaleInput};
use dairyledger_stock::{Balance, StockStore};

use super::DairyLedger;

impl<S, B> DairyLedger<S, B>
where
    S: StockStore,
    B: EventBus<LedgerEvent>,
{
    /// Record a sale; rejected with `Insufficient` when stock cannot cover it.
    pub fn record_sale(&self, input: SaleInput) -> DomainResult<SaleEntry> {
        self.product(input.product_id)?;
        let entry = SaleEntry::derive(EntryId::new(), input)?;

        let balance = self
            .engine
            .apply_with(entry.product_id, entry.delta(), entry.date, |_| {
                self.ensure_listed(entry.product_id)?;
                self.stores.sales.replace(entry.id, None, Some(entry.clone()))
            })?;

        tracing::info!(
            entry_id = %entry.id,
            product_id = %entry.product_id,
            quantity = %entry.quantity,
            "sale recorded"
        );
        self.publish(LedgerEvent::SaleRecorded {
            entry: entry.clone(),
            balance_after: balance.current_quantity,
        });
        Ok(entry)
    }

    /// Replace a sale, possibly moving it to another product.
    pub fn edit_sale(&self, entry_id: EntryId, input: SaleInput) -> DomainResult<SaleEntry> {
        let previous = self.existing_sale(entry_id)?;
        self.product(input.product_id)?;
        let entry = SaleEntry::derive(entry_id, input)?;

        let outcome = self.engine.retract_and_reapply_with(
            previous.product_id,
            previous.delta(),
            entry.product_id,
            entry.delta(),
            entry.date,
            |_| {
                self.ensure_listed(entry.product_id)?;
                self.stores
                    .sales
                    .replace(entry_id, Some(&previous), Some(entry.clone()))
            },
        )?;

        tracing::info!(%entry_id, product_id = %entry.product_id, "sale revised");
        self.publish(LedgerEvent::SaleRevised {
            previous,
            entry: entry.clone(),
            balance_after: outcome.balance.current_quantity,
        });
        Ok(entry)
    }

    /// Delete a sale and return its quantity to stock.
    pub fn delete_sale(&self, entry_id: EntryId, date: NaiveDate) -> DomainResult<Balance> {
        let previous = self.existing_sale(entry_id)?;
        let retracted = previous.delta();

        let balance = self
            .engine
            .retract_with(previous.product_id, retracted, date, |_| {
                self.stores.sales.replace(entry_id, Some(&previous), None)
            })?;

        tracing::info!(%entry_id, product_id = %previous.product_id, "sale deleted");
        self.publish(LedgerEvent::SaleDeleted {
            entry_id,
            product_id: previous.product_id,
            retracted,
            balance_after: balance.current_quantity,
            occurred_on: date,
        });
        Ok(balance)
    }

    pub fn sale(&self, entry_id: EntryId) -> Option<SaleEntry> {
        self.stores.sales.get(&entry_id)
    }

    pub fn sales(&self) -> Vec<SaleEntry> {
        self.stores.sales.list()
    }

    fn existing_sale(&self, entry_id: EntryId) -> DomainResult<SaleEntry> {
        self.sale(entry_id)
            .ok_or_else(|| DomainError::not_found(format!("sale {entry_id}")))
    }
}
