//! `dairyledger-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, validated quantities and the shared error model.

pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;
pub mod value_object;

pub use entity::Entity;
pub use error::{AvailabilityError, DomainError, DomainResult};
pub use id::{
    CustomerId, EmployeeId, EntryId, MilkCollectionId, MilkSeparationId, ProductId, ShopId,
    SupplierId,
};
pub use quantity::Quantity;
pub use value_object::ValueObject;
