//! Error types for the indexer domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Business logic errors
//! - [`StorageError`] - Entity store errors
//! - [`EngineError`] - Top-level aggregation errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Domain Errors
// =============================================================================

/// Business logic and domain rule violations.
///
/// These errors represent problems in the aggregation logic itself, such as
/// event payloads that cannot be represented in the derived model. A missing
/// counterpart entity is *not* an error - handlers treat it as a documented
/// best-effort skip.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An address failed hex validation.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A raw on-chain amount could not be represented as a decimal.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Data decoding/deserialization failed.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// No handler registered for an event kind.
    #[error("Handler not found for event kind: {0}")]
    HandlerNotFound(String),

    /// Generic validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Entity store errors.
///
/// These errors originate from load/save operations against the
/// persistence substrate.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Transaction commit/rollback failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Entity serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Engine Errors
// =============================================================================

/// Top-level aggregation engine errors.
///
/// This is the main error type returned by
/// [`crate::services::AggregationEngine`]. A failed event must be retried in
/// full from the top of its handler; partial application is never silently
/// continued.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain logic error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Entity store error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    // La chaîne de conversion d'erreurs doit permettre ? à travers les couches
    #[test]
    fn test_error_conversion_chain() {
        // Storage -> Domain -> Engine
        let storage_err = StorageError::QueryError("db failed".into());
        let domain_err: DomainError = storage_err.into();
        let engine_err: EngineError = domain_err.into();

        // Le message original est préservé
        assert!(engine_err.to_string().contains("db failed"));

        // Storage -> Engine directement
        let storage_err = StorageError::NotFound("protocol".into());
        let engine_err: EngineError = storage_err.into();
        assert!(engine_err.to_string().contains("protocol"));
    }
}
