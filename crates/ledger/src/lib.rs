//! Ledger entry model.
//!
//! Turns recorder input into immutable ledger entries and the signed stock delta
//! each one carries. Pure domain logic: no IO, no locking, no storage.

pub mod delta;
pub mod entry;
pub mod event;
pub mod intake;

pub use delta::{
    Delta, PRODUCED_QUANTITY_SCALE, ProductionDelta, compute_production_delta, compute_sale_delta,
    effective_ratio,
};
pub use entry::{EntryKind, LedgerEntry, ProductionEntry, ProductionInput, SaleEntry, SaleInput};
pub use event::LedgerEvent;
pub use intake::{
    MilkCollection, MilkCollectionInput, MilkSeparation, MilkSeparationInput, MilkSource,
    total_liters,
};
