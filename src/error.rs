//! Domain error taxonomy.
//!
//! Every fallible operation in the resource managers and the booking workflow
//! returns one of these variants. Validation and state errors are detected
//! before any mutation, so an error response never leaves partial state
//! behind; reservation conflicts during multi-resource booking creation are
//! compensated before the error surfaces.

use thiserror::Error;

/// Convenient result alias for domain operations.
pub type Result<T, E = DomainError> = std::result::Result<T, E>;

/// Errors surfaced by the booking workflow and its resource managers.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A resource (plot, staff slot) was taken by a concurrent request.
    /// The caller must re-select.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Requested kit quantity exceeds available stock.
    #[error("insufficient stock: {0}")]
    InsufficientStock(String),

    /// An adjustment would take available stock below zero.
    #[error("stock cannot go negative: {0}")]
    NegativeStock(String),

    /// The booking already holds a reservation for this kit type.
    #[error("duplicate reservation: {0}")]
    DuplicateReservation(String),

    /// The action is not permitted from the booking's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Mandatory input is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The caller is not allowed to perform this action.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// Datastore or object-storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Builds a [`DomainError::Conflict`].
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Builds a [`DomainError::InvalidState`].
    #[must_use]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Builds a [`DomainError::Validation`].
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Builds a [`DomainError::NotFound`] from an entity name and id.
    #[must_use]
    pub fn not_found(entity: impl std::fmt::Display, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }

    /// Builds a [`DomainError::Authorization`].
    #[must_use]
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Builds a [`DomainError::Storage`].
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row".to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}
