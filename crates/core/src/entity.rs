//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog products, ledger entries and milk intake records are entities: an
/// edit keeps the identifier and replaces the attributes.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
