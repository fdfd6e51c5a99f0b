use chrono::NaiveDate;

use dairyledger_core::{DomainError, DomainResult, EntryId};
use dairyledger_events::EventBus;
use dairyledger_ledger::{LedgerEvent, ProductionEntry, ProductionInput};
use dairyledger_stock::{Balance, StockStore};

use super::DairyLedger;

impl<S, B> DairyLedger<S, B>
where
    S: StockStore,
    B: EventBus<LedgerEvent>,
{
    /// Record a production run and add its output to stock.
    pub fn record_production(&self, input: ProductionInput) -> DomainResult<ProductionEntry> {
        let product = self.product(input.product_id)?;
        let entry = ProductionEntry::derive(EntryId::new(), &product, input)?;

        let balance = self
            .engine
            .apply_with(entry.product_id, entry.delta(), entry.date, |_| {
                self.ensure_listed(entry.product_id)?;
                self.stores.productions.replace(entry.id, None, Some(entry.clone()))
            })?;

        tracing::info!(
            entry_id = %entry.id,
            product_id = %entry.product_id,
            quantity_produced = %entry.quantity_produced,
            unit = product.unit(),
            "production recorded"
        );
        self.publish(LedgerEvent::ProductionRecorded {
            entry: entry.clone(),
            balance_after: balance.current_quantity,
        });
        Ok(entry)
    }

    /// Replace a production run.
    ///
    /// The stored quantity of the old run is retracted as recorded; the new run
    /// is derived with the product's current ratio.
    pub fn edit_production(
        &self,
        entry_id: EntryId,
        input: ProductionInput,
    ) -> DomainResult<ProductionEntry> {
        let previous = self.existing_production(entry_id)?;
        let product = self.product(input.product_id)?;
        let entry = ProductionEntry::derive(entry_id, &product, input)?;

        let outcome = self.engine.retract_and_reapply_with(
            previous.product_id,
            previous.delta(),
            entry.product_id,
            entry.delta(),
            entry.date,
            |_| {
                self.ensure_listed(entry.product_id)?;
                self.stores
                    .productions
                    .replace(entry_id, Some(&previous), Some(entry.clone()))
            },
        )?;

        tracing::info!(%entry_id, product_id = %entry.product_id, "production revised");
        self.publish(LedgerEvent::ProductionRevised {
            previous,
            entry: entry.clone(),
            balance_after: outcome.balance.current_quantity,
        });
        Ok(entry)
    }

    /// Delete a production run and take its output back out of stock.
    pub fn delete_production(&self, entry_id: EntryId, date: NaiveDate) -> DomainResult<Balance> {
        let previous = self.existing_production(entry_id)?;
        let retracted = previous.delta();

        let balance = self
            .engine
            .retract_with(previous.product_id, retracted, date, |_| {
                self.stores.productions.replace(entry_id, Some(&previous), None)
            })?;

        tracing::info!(%entry_id, product_id = %previous.product_id, "production deleted");
        self.publish(LedgerEvent::ProductionDeleted {
            entry_id,
            product_id: previous.product_id,
            retracted,
            balance_after: balance.current_quantity,
            occurred_on: date,
        });
        Ok(balance)
    }

    pub fn production(&self, entry_id: EntryId) -> Option<ProductionEntry> {
        self.stores.productions.get(&entry_id)
    }

    pub fn productions(&self) -> Vec<ProductionEntry> {
        self.stores.productions.list()
    }

    fn existing_production(&self, entry_id: EntryId) -> DomainResult<ProductionEntry> {
        self.production(entry_id)
            .ok_or_else(|| DomainError::not_found(format!("production {entry_id}")))
    }
}
