//! The dairy ledger: recorders for products, production, sales and milk intake.
//!
//! Every stock-affecting operation follows the same pipeline:
//!
//! 1. validate the input and derive the ledger entry
//! 2. reconcile through the engine, writing the history row inside the same
//!    unit of work (a rejected reconciliation writes no row)
//! 3. publish a `LedgerEvent` once committed

mod audit;
mod intake;
mod production;
mod products;
mod sales;

use std::sync::Arc;

use dairyledger_catalog::{InMemoryProductCatalog, Product, ProductCatalog};
use dairyledger_core::{
    DomainError, DomainResult, EntryId, MilkCollectionId, MilkSeparationId, ProductId,
};
use dairyledger_events::{Event, EventBus};
use dairyledger_ledger::{LedgerEvent, MilkCollection, MilkSeparation, ProductionEntry, SaleEntry};
use dairyledger_stock::{Balance, ReconciliationEngine, StockStore};

use crate::config::CatalogConfig;
use crate::read_model::{EntryStore, InMemoryEntryStore, RowLocks};

pub use audit::StockDrift;

/// Record stores used by the ledger (catalog and history rows).
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn ProductCatalog>,
    pub productions: Arc<dyn EntryStore<EntryId, ProductionEntry>>,
    pub sales: Arc<dyn EntryStore<EntryId, SaleEntry>>,
    pub collections: Arc<dyn EntryStore<MilkCollectionId, MilkCollection>>,
    pub separations: Arc<dyn EntryStore<MilkSeparationId, MilkSeparation>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(InMemoryProductCatalog::new()),
            productions: Arc::new(InMemoryEntryStore::new()),
            sales: Arc::new(InMemoryEntryStore::new()),
            collections: Arc::new(InMemoryEntryStore::new()),
            separations: Arc::new(InMemoryEntryStore::new()),
        }
    }
}

/// A product together with its on-hand balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub product: Product,
    pub balance: Balance,
}

pub struct DairyLedger<S, B>
where
    S: StockStore,
    B: EventBus<LedgerEvent>,
{
    catalog_config: CatalogConfig,
    stores: Stores,
    engine: ReconciliationEngine<S>,
    bus: B,
    intake_locks: RowLocks<MilkCollectionId>,
}

impl<S, B> DairyLedger<S, B>
where
    S: StockStore,
    B: EventBus<LedgerEvent>,
{
    pub fn new(catalog_config: CatalogConfig, stores: Stores, stock: S, bus: B) -> Self {
        Self {
            catalog_config,
            stores,
            engine: ReconciliationEngine::new(stock),
            bus,
            intake_locks: RowLocks::new(),
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine<S> {
        &self.engine
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Current balance of one product.
    pub fn stock(&self, product_id: ProductId) -> DomainResult<Balance> {
        self.engine.balance(product_id)
    }

    /// Balance of every catalog product, lowest stock first (ties by name).
    pub fn stock_levels(&self) -> DomainResult<Vec<StockLevel>> {
        let mut levels = self
            .stores
            .catalog
            .list()
            .into_iter()
            .map(|product| {
                let balance = self.engine.balance(product.id_typed())?;
                Ok(StockLevel { product, balance })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        levels.sort_by(|a, b| a.balance.current_quantity.cmp(&b.balance.current_quantity));
        Ok(levels)
    }

    fn product(&self, product_id: ProductId) -> DomainResult<Product> {
        self.stores
            .catalog
            .get(&product_id)
            .ok_or(DomainError::MissingProduct(product_id))
    }

    /// Re-check catalog membership while the product's stock row is locked.
    fn ensure_listed(&self, product_id: ProductId) -> DomainResult<()> {
        self.product(product_id).map(|_| ())
    }

    fn publish(&self, event: LedgerEvent) {
        let event_type = event.event_type();
        // The change is already committed; a lost notification must not undo it.
        if let Err(error) = self.bus.publish(event) {
            tracing::warn!(event_type, ?error, "failed to publish ledger event");
        }
    }
}
