//! Process wiring: configuration, logging and the in-memory ledger.

use anyhow::Context;

use dairyledger_events::InMemoryEventBus;
use dairyledger_ledger::LedgerEvent;
use dairyledger_stock::InMemoryStockStore;

use crate::config::DairyConfig;
use crate::dairy::{DairyLedger, Stores};

/// Ledger backed entirely by in-memory stores.
pub type InMemoryDairy = DairyLedger<InMemoryStockStore, InMemoryEventBus<LedgerEvent>>;

/// Build an in-memory ledger for `config` (no logging setup).
pub fn in_memory(config: &DairyConfig) -> InMemoryDairy {
    DairyLedger::new(
        config.catalog.clone(),
        Stores::in_memory(),
        InMemoryStockStore::new(),
        InMemoryEventBus::new(),
    )
}

/// Load configuration, initialize logging and build the ledger.
pub fn bootstrap() -> anyhow::Result<(DairyConfig, InMemoryDairy)> {
    let config = DairyConfig::load().context("failed to load dairy configuration")?;
    dairyledger_observability::init(&config.logging);

    tracing::info!(environment = %config.environment, "dairy ledger ready");
    let dairy = in_memory(&config);
    Ok((config, dairy))
}
