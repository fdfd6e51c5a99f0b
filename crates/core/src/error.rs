//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// A consumption would drive a product's balance below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityError {
    pub product_id: ProductId,
    /// Magnitude of the rejected consumption.
    pub requested: Decimal,
    /// Balance at the time of the rejection.
    pub available: Decimal,
}

impl core::fmt::Display for AvailabilityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "insufficient stock for product {}: requested {}, available {}",
            self.product_id, self.requested, self.available
        )
    }
}

/// Domain-level error.
///
/// Every variant is a synchronous, local failure returned to the immediate caller.
/// Nothing here is transient, so nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A quantity was non-numeric, negative or non-finite.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A consumption was rejected by the availability check.
    #[error("{0}")]
    Insufficient(AvailabilityError),

    /// The referenced product has no catalog entry.
    #[error("product not found: {0}")]
    MissingProduct(ProductId),

    /// A ledger entry or intake record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A non-quantity field failed validation (e.g. empty product name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record changed between read and write (concurrent edit).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be accessed (lock poisoning, ...).
    #[error("store unavailable: {0}")]
    Store(String),
}

impl DomainError {
    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn insufficient(product_id: ProductId, requested: Decimal, available: Decimal) -> Self {
        Self::Insufficient(AvailabilityError {
            product_id,
            requested,
            available,
        })
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Returns the availability details when this is a stock rejection.
    pub fn availability(&self) -> Option<&AvailabilityError> {
        match self {
            Self::Insufficient(e) => Some(e),
            _ => None,
        }
    }
}
