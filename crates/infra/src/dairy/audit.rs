//! Consistency check of stored balances against ledger history.

use rust_decimal::Decimal;

use dairyledger_core::{DomainError, DomainResult, EntryId, ProductId};
use dairyledger_events::EventBus;
use dairyledger_ledger::{Delta, LedgerEvent};
use dairyledger_stock::StockStore;

use super::DairyLedger;

/// A product whose stored balance differs from the fold of its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDrift {
    pub product_id: ProductId,
    pub recorded: Decimal,
    pub expected: Decimal,
}

impl<S, B> DairyLedger<S, B>
where
    S: StockStore,
    B: EventBus<LedgerEvent>,
{
    /// Expected balance: production minus sales over the surviving entries.
    ///
    /// Summed in entry order (ids are time-ordered) so the running total follows
    /// the balance's own history.
    pub fn folded_quantity(&self, product_id: ProductId) -> DomainResult<Decimal> {
        let mut deltas: Vec<(EntryId, Delta)> = self
            .stores
            .productions
            .list()
            .iter()
            .filter(|e| e.product_id == product_id)
            .map(|e| (e.id, e.delta()))
            .chain(
                self.stores
                    .sales
                    .list()
                    .iter()
                    .filter(|e| e.product_id == product_id)
                    .map(|e| (e.id, e.delta())),
            )
            .collect();
        deltas.sort_by_key(|(id, _)| *id);

        deltas.into_iter().try_fold(Decimal::ZERO, |total, (_, delta)| {
            total.checked_add(delta.value()).ok_or_else(|| {
                DomainError::invalid_quantity(format!(
                    "history of product {product_id} sums out of range"
                ))
            })
        })
    }

    /// Every catalog product whose balance has drifted from its history.
    pub fn audit_stock(&self) -> DomainResult<Vec<StockDrift>> {
        let mut drifts = Vec::new();
        for product in self.stores.catalog.list() {
            let product_id = product.id_typed();
            let recorded = self.engine.balance(product_id)?.current_quantity;
            let expected = self.folded_quantity(product_id)?;
            if recorded != expected {
                tracing::warn!(%product_id, %recorded, %expected, "stock drift detected");
                drifts.push(StockDrift {
                    product_id,
                    recorded,
                    expected,
                });
            }
        }
        Ok(drifts)
    }
}
