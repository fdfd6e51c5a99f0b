//! History storage for ledger entries and intake records.

pub mod entry_store;
pub mod row_locks;

pub use entry_store::{EntryStore, InMemoryEntryStore};
pub use row_locks::RowLocks;
