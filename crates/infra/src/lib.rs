//! Infrastructure layer: configuration, record stores and the recorders that
//! tie catalog, ledger history and stock reconciliation together.

pub mod bootstrap;
pub mod config;
pub mod dairy;
pub mod read_model;

mod integration_tests;

pub use bootstrap::{InMemoryDairy, bootstrap, in_memory};
pub use config::{CatalogConfig, DairyConfig};
pub use dairy::{DairyLedger, StockDrift, StockLevel, Stores};
