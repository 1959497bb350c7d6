//! Typed errors for the store crate.

use thiserror::Error;

/// Errors that can occur while talking to a recipe store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to establish a connection to the database.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A statement against the database failed.
    #[error("query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}
