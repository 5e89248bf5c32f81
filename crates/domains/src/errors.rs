//! # DomainError
//!
//! Centralized error handling for the scoring core.
//! Every port and service returns this type; adapters translate their own
//! failures into it at the boundary.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Caller-fixable input problem (missing field, unknown enum literal,
    /// out-of-range score, unknown voter).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Referenced entity does not exist (e.g., Tool, Review, User)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// Infrastructure failure (e.g., DB down, write rejected)
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// A specialized Result type for domain logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
