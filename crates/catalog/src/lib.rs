//! Product catalog: what the dairy makes and how much milk each unit takes.
//!
//! The catalog is owned here; ledger entries only ever reference a product by id.

pub mod product;
pub mod store;

pub use product::{Product, ProductDraft};
pub use store::{InMemoryProductCatalog, ProductCatalog};
