//! Error types for the database client and stores

use thiserror::Error;

/// Errors that can occur when working with the database
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A stored value could not be turned back into a model
    #[error("Database decode error: {0}")]
    DecodeError(String),

    /// The enclosing transaction could not be opened or committed; nothing
    /// written inside it was kept
    #[error("Database transaction aborted: {0}")]
    TransactionAborted(String),
}

/// One row of a batch that the store refused. The rest of the batch is
/// unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowInsertFailed {
    /// Position of the row in the submitted batch
    pub index: usize,
    pub reason: String,
}
