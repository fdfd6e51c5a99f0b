//! Reconciliation engine: the single authority over stock balances.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use dairyledger_core::{DomainError, DomainResult, ProductId};
use dairyledger_ledger::Delta;

use crate::balance::Balance;
use crate::store::{StockStore, StockTransaction};

/// Outcome of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reapplied {
    /// Balance of the product the entry now belongs to.
    pub balance: Balance,
    /// Balance of the product the entry was moved away from, when it moved.
    pub previous_product: Option<Balance>,
}

/// Applies ledger deltas to balances under the availability rule.
///
/// - A consumption (negative delta) that would leave the balance below zero is
///   rejected with `DomainError::Insufficient` and nothing is written.
/// - Production is never rejected.
/// - Retractions are never rejected.
#[derive(Debug)]
pub struct ReconciliationEngine<S>
where
    S: StockStore,
{
    store: S,
}

impl<S> ReconciliationEngine<S>
where
    S: StockStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current balance of a product (zero when no row exists).
    pub fn balance(&self, product_id: ProductId) -> DomainResult<Balance> {
        self.store.get(product_id)
    }

    /// Apply a delta under the availability check.
    pub fn apply(&self, product_id: ProductId, delta: Delta, date: NaiveDate) -> DomainResult<Balance> {
        self.apply_with(product_id, delta, date, |_| Ok(()))
    }

    /// Like [`apply`](Self::apply), running `commit` inside the same unit of work.
    ///
    /// `commit` sees the staged balance; if it fails, the balance is not written.
    /// Recorders use it to write the history row atomically with the balance.
    pub fn apply_with<F>(
        &self,
        product_id: ProductId,
        delta: Delta,
        date: NaiveDate,
        commit: F,
    ) -> DomainResult<Balance>
    where
        F: FnOnce(&Balance) -> DomainResult<()>,
    {
        let result = self.store.transact(&[product_id], |tx| {
            let balance = checked_apply(tx, product_id, delta, date)?;
            commit(&balance)?;
            Ok(balance)
        });
        log_outcome("apply", product_id, delta, &result);
        result
    }

    /// Undo a previously applied delta. Always admissible.
    pub fn retract(&self, product_id: ProductId, delta: Delta, date: NaiveDate) -> DomainResult<Balance> {
        self.retract_with(product_id, delta, date, |_| Ok(()))
    }

    /// Like [`retract`](Self::retract), running `commit` inside the same unit of work.
    pub fn retract_with<F>(
        &self,
        product_id: ProductId,
        delta: Delta,
        date: NaiveDate,
        commit: F,
    ) -> DomainResult<Balance>
    where
        F: FnOnce(&Balance) -> DomainResult<()>,
    {
        let result = self.store.transact(&[product_id], |tx| {
            let balance = force_apply(tx, product_id, -delta, date)?;
            commit(&balance)?;
            Ok(balance)
        });
        log_outcome("retract", product_id, -delta, &result);
        result
    }

    /// Replace an entry's old delta with a new one, possibly on another product.
    ///
    /// Both rows are locked in one unit of work. When the entry moves between
    /// products the old delta is retracted unconditionally and the new delta is
    /// applied under the availability check; if that check fails neither
    /// balance changes.
    pub fn retract_and_reapply(
        &self,
        old_product_id: ProductId,
        old_delta: Delta,
        new_product_id: ProductId,
        new_delta: Delta,
        date: NaiveDate,
    ) -> DomainResult<Reapplied> {
        self.retract_and_reapply_with(old_product_id, old_delta, new_product_id, new_delta, date, |_| {
            Ok(())
        })
    }

    /// Like [`retract_and_reapply`](Self::retract_and_reapply), running `commit`
    /// inside the same unit of work.
    pub fn retract_and_reapply_with<F>(
        &self,
        old_product_id: ProductId,
        old_delta: Delta,
        new_product_id: ProductId,
        new_delta: Delta,
        date: NaiveDate,
        commit: F,
    ) -> DomainResult<Reapplied>
    where
        F: FnOnce(&Reapplied) -> DomainResult<()>,
    {
        let result = self
            .store
            .transact(&[old_product_id, new_product_id], |tx| {
                let outcome = if old_product_id == new_product_id {
                    let net = new_delta.checked_sub(old_delta)?;
                    Reapplied {
                        balance: checked_apply(tx, new_product_id, net, date)?,
                        previous_product: None,
                    }
                } else {
                    let previous = force_apply(tx, old_product_id, -old_delta, date)?;
                    Reapplied {
                        balance: checked_apply(tx, new_product_id, new_delta, date)?,
                        previous_product: Some(previous),
                    }
                };
                commit(&outcome)?;
                Ok(outcome)
            });

        match &result {
            Ok(outcome) => tracing::info!(
                %old_product_id,
                %new_product_id,
                %old_delta,
                %new_delta,
                quantity = %outcome.balance.current_quantity,
                "stock reapplied"
            ),
            Err(err) => tracing::warn!(
                %old_product_id,
                %new_product_id,
                %old_delta,
                %new_delta,
                error = %err,
                "stock reapply rejected"
            ),
        }
        result
    }
}

fn candidate(current: &Balance, delta: Delta) -> DomainResult<Decimal> {
    current
        .current_quantity
        .checked_add(delta.value())
        .ok_or_else(|| {
            DomainError::invalid_quantity(format!(
                "balance {} plus {delta} overflows",
                current.current_quantity
            ))
        })
}

fn checked_apply(
    tx: &mut StockTransaction,
    product_id: ProductId,
    delta: Delta,
    date: NaiveDate,
) -> DomainResult<Balance> {
    let current = tx.balance(product_id)?;
    let next = candidate(current, delta)?;

    if delta.is_consumption() && next.is_sign_negative() && !next.is_zero() {
        return Err(DomainError::insufficient(
            product_id,
            delta.magnitude(),
            current.current_quantity,
        ));
    }

    tx.set(product_id, next, date)
}

fn force_apply(
    tx: &mut StockTransaction,
    product_id: ProductId,
    delta: Delta,
    date: NaiveDate,
) -> DomainResult<Balance> {
    let next = candidate(tx.balance(product_id)?, delta)?;
    if next.is_sign_negative() && !next.is_zero() {
        tracing::warn!(
            %product_id,
            %delta,
            quantity = %next,
            "retraction leaves stock below zero"
        );
    }
    tx.set(product_id, next, date)
}

fn log_outcome(op: &'static str, product_id: ProductId, delta: Delta, result: &DomainResult<Balance>) {
    match result {
        Ok(balance) => tracing::info!(
            op,
            %product_id,
            %delta,
            quantity = %balance.current_quantity,
            "stock updated"
        ),
        Err(err) => tracing::warn!(op, %product_id, %delta, error = %err, "stock update rejected"),
    }
}
