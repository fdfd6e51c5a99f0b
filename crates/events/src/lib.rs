//! Ledger notifications: the `Event` contract and a small pub/sub bus.
//!
//! Recorders publish an event after every committed stock-affecting operation so
//! that reporting collaborators can refresh without polling the stores.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
