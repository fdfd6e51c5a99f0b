//! Stock balance storage.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use dairyledger_core::{DomainError, DomainResult, ProductId};

use crate::balance::Balance;

/// Durable mapping from product to balance.
///
/// Implementations must make `transact` serialize with every other `transact`
/// touching any of the same products, and must commit the staged writes of a
/// unit of work all-or-nothing.
pub trait StockStore: Send + Sync {
    /// Current balance; an absent row reads as zero.
    fn get(&self, product_id: ProductId) -> DomainResult<Balance>;

    /// Create the zero row for a newly created product.
    fn initialize(&self, product_id: ProductId, date: NaiveDate) -> DomainResult<Balance>;

    /// Drop the row of a deleted product.
    fn remove(&self, product_id: ProductId) -> DomainResult<Option<Balance>>;

    /// Every existing row.
    fn list(&self) -> DomainResult<Vec<Balance>>;

    /// Run `work` with exclusive access to the rows of `product_ids`.
    ///
    /// Writes staged on the transaction are committed only when `work` returns `Ok`.
    fn transact<R, F>(&self, product_ids: &[ProductId], work: F) -> DomainResult<R>
    where
        F: FnOnce(&mut StockTransaction) -> DomainResult<R>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn get(&self, product_id: ProductId) -> DomainResult<Balance> {
        (**self).get(product_id)
    }

    fn initialize(&self, product_id: ProductId, date: NaiveDate) -> DomainResult<Balance> {
        (**self).initialize(product_id, date)
    }

    fn remove(&self, product_id: ProductId) -> DomainResult<Option<Balance>> {
        (**self).remove(product_id)
    }

    fn list(&self) -> DomainResult<Vec<Balance>> {
        (**self).list()
    }

    fn transact<R, F>(&self, product_ids: &[ProductId], work: F) -> DomainResult<R>
    where
        F: FnOnce(&mut StockTransaction) -> DomainResult<R>,
    {
        (**self).transact(product_ids, work)
    }
}

/// A unit of work over a fixed set of locked balance rows.
///
/// Reads see the staged writes of the same transaction. `set` is crate-private:
/// only the reconciliation engine stages balance changes.
#[derive(Debug)]
pub struct StockTransaction {
    rows: BTreeMap<ProductId, Balance>,
    dirty: BTreeSet<ProductId>,
}

impl StockTransaction {
    /// Start a unit of work from the current rows.
    pub fn begin(rows: impl IntoIterator<Item = Balance>) -> Self {
        Self {
            rows: rows.into_iter().map(|b| (b.product_id, b)).collect(),
            dirty: BTreeSet::new(),
        }
    }

    pub fn balance(&self, product_id: ProductId) -> DomainResult<&Balance> {
        self.rows.get(&product_id).ok_or_else(|| {
            DomainError::store(format!("product {product_id} is not locked by this transaction"))
        })
    }

    pub(crate) fn set(
        &mut self,
        product_id: ProductId,
        quantity: Decimal,
        date: NaiveDate,
    ) -> DomainResult<Balance> {
        let row = self.rows.get_mut(&product_id).ok_or_else(|| {
            DomainError::store(format!("product {product_id} is not locked by this transaction"))
        })?;
        row.current_quantity = quantity;
        row.last_updated = Some(date);
        self.dirty.insert(product_id);
        Ok(row.clone())
    }

    /// Rows written during the unit of work, in product order.
    pub fn into_changes(self) -> Vec<Balance> {
        let Self { mut rows, dirty } = self;
        dirty.into_iter().filter_map(|id| rows.remove(&id)).collect()
    }
}

type Row = Arc<Mutex<Option<Balance>>>;

/// In-memory balance store for tests/dev.
///
/// One mutex per product row; the outer map lock is held only to find, create
/// or drop a row, never across a unit of work. A slot left without a balance
/// (unknown product, rejected unit of work, removed product) is dropped from
/// the map once no other unit of work holds it.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    rows: RwLock<HashMap<ProductId, Row>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, product_id: ProductId) -> DomainResult<Row> {
        {
            let rows = self.rows.read().map_err(|_| poisoned())?;
            if let Some(row) = rows.get(&product_id) {
                return Ok(row.clone());
            }
        }

        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        Ok(rows.entry(product_id).or_default().clone())
    }

    fn existing_row(&self, product_id: ProductId) -> DomainResult<Option<Row>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&product_id).cloned())
    }

    /// Drop the slot of `product_id` if it is empty and `row` is its last user.
    fn reclaim(&self, product_id: ProductId, row: Row) -> DomainResult<()> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        // With only the map and `row` owning the slot, nobody holds or waits on it.
        let unused = Arc::strong_count(&row) == 2
            && rows.get(&product_id).is_some_and(|r| Arc::ptr_eq(r, &row))
            && lock(&row)?.is_none();
        drop(row);
        if unused {
            rows.remove(&product_id);
        }
        Ok(())
    }
}

fn poisoned() -> DomainError {
    DomainError::store("stock store lock poisoned")
}

fn lock(row: &Row) -> DomainResult<MutexGuard<'_, Option<Balance>>> {
    row.lock().map_err(|_| poisoned())
}

impl StockStore for InMemoryStockStore {
    fn get(&self, product_id: ProductId) -> DomainResult<Balance> {
        match self.existing_row(product_id)? {
            Some(row) => Ok(lock(&row)?
                .clone()
                .unwrap_or_else(|| Balance::absent(product_id))),
            None => Ok(Balance::absent(product_id)),
        }
    }

    fn initialize(&self, product_id: ProductId, date: NaiveDate) -> DomainResult<Balance> {
        let row = self.row(product_id)?;
        let mut slot = lock(&row)?;
        if slot.is_some() {
            return Err(DomainError::validation(format!(
                "stock for product {product_id} is already initialized"
            )));
        }
        let balance = Balance::initial(product_id, date);
        *slot = Some(balance.clone());
        Ok(balance)
    }

    fn remove(&self, product_id: ProductId) -> DomainResult<Option<Balance>> {
        let Some(row) = self.existing_row(product_id)? else {
            return Ok(None);
        };
        let removed = lock(&row)?.take();
        self.reclaim(product_id, row)?;
        Ok(removed)
    }

    fn list(&self) -> DomainResult<Vec<Balance>> {
        let rows: Vec<Row> = {
            let map = self.rows.read().map_err(|_| poisoned())?;
            map.values().cloned().collect()
        };

        let mut balances = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(balance) = lock(row)?.clone() {
                balances.push(balance);
            }
        }
        balances.sort_by_key(|b| b.product_id);
        Ok(balances)
    }

    fn transact<R, F>(&self, product_ids: &[ProductId], work: F) -> DomainResult<R>
    where
        F: FnOnce(&mut StockTransaction) -> DomainResult<R>,
    {
        // Lock in a global order so two units of work over the same pair of
        // products cannot deadlock.
        let mut ids = product_ids.to_vec();
        ids.sort();
        ids.dedup();

        let rows = ids
            .iter()
            .map(|id| self.row(*id).map(|row| (*id, row)))
            .collect::<DomainResult<Vec<_>>>()?;

        let (result, vacant) = {
            let mut guards = Vec::with_capacity(rows.len());
            for (id, row) in &rows {
                guards.push((*id, lock(row)?));
            }

            let mut tx = StockTransaction::begin(
                guards
                    .iter()
                    .map(|(id, slot)| (**slot).clone().unwrap_or_else(|| Balance::absent(*id))),
            );

            let result = work(&mut tx);
            if result.is_ok() {
                for change in tx.into_changes() {
                    if let Some((_, slot)) =
                        guards.iter_mut().find(|(id, _)| *id == change.product_id)
                    {
                        **slot = Some(change);
                    }
                }
            }

            let vacant: Vec<ProductId> = guards
                .iter()
                .filter(|(_, slot)| slot.is_none())
                .map(|(id, _)| *id)
                .collect();
            (result, vacant)
        };

        for (id, row) in rows {
            if vacant.contains(&id) {
                self.reclaim(id, row)?;
            }
        }

        result
    }
}
