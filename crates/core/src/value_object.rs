//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; two value objects with the same values are
//! considered equal. `Quantity` and ledger deltas are value objects.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// let a = Quantity::from_f64(30.0)?;
/// let b = Quantity::from_f64(30.0)?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
