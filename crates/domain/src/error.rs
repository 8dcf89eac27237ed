//! Unified error types for the domain layer
//!
//! Provides a common error type for value construction and tile mutation,
//! so the engine can propagate domain failures without resorting to strings.

use thiserror::Error;

use crate::direction::Direction;
use crate::grid::GridPosition;
use crate::prefab::PrefabCategory;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// An argument was outside the accepted domain (e.g. 45 degrees)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Validation failed (e.g., empty prefab identifier)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The prefab catalog has nothing to offer for a category
    #[error("No prefabs available in category {0}")]
    CatalogEmpty(PrefabCategory),

    /// A tile face already carries a gate
    #[error("Gate already set on tile {position} facing {direction}")]
    GateAlreadySet {
        position: GridPosition,
        direction: Direction,
    },
}

impl DomainError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a validation error for violated construction invariants.
    ///
    /// # Example
    /// ```ignore
    /// if id.trim().is_empty() {
    ///     return Err(DomainError::validation("Prefab identifier cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a catalog empty error
    pub fn catalog_empty(category: PrefabCategory) -> Self {
        Self::CatalogEmpty(category)
    }

    /// Whether this error only means "nothing to choose from".
    pub fn is_catalog_empty(&self) -> bool {
        matches!(self, Self::CatalogEmpty(_))
    }
}
