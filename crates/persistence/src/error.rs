//! Repository error type.

use thiserror::Error;

/// Errors surfaced by the repositories.
///
/// `StaleVersion` is the only retryable variant: it means an optimistic
/// write observed a version other than the one it read. Everything else
/// propagates immediately.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record changed since it was read (stale version)")]
    StaleVersion,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
