//! Stock balances and the reconciliation engine.
//!
//! `ReconciliationEngine` is the only code allowed to change a balance. Every
//! change runs inside a `StockStore::transact` unit of work that locks the
//! affected product rows, so unrelated products reconcile concurrently while
//! operations on the same product serialize.

pub mod balance;
pub mod engine;
pub mod store;

pub use balance::Balance;
pub use engine::{ReconciliationEngine, Reapplied};
pub use store::{InMemoryStockStore, StockStore, StockTransaction};
