//! Orchestration services.
//!
//! Handlers stay thin; these services own transaction scopes, the
//! optimistic-retry loop, and the ordering between the relational store
//! and the geo index.

pub mod matches;
pub mod participations;
pub mod retry;

pub use matches::MatchService;
pub use participations::ParticipationService;
pub use retry::RetryPolicy;

use thiserror::Error;

use domain::error::DomainError;
use domain::services::{GeoIndexError, ProviderError};
use persistence::error::RepositoryError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A single optimistic version check failed. Transient; the retry
    /// wrapper re-reads and re-applies before surfacing anything.
    #[error("Optimistic version conflict")]
    VersionConflict,

    /// Retries exhausted without a successful commit.
    #[error("Concurrent modification, retries exhausted")]
    Conflict,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    GeoIndex(#[from] GeoIndexError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::StaleVersion => ServiceError::VersionConflict,
            RepositoryError::Database(e) => ServiceError::Database(e),
        }
    }
}

impl ServiceError {
    /// Whether the error is worth another optimistic attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::VersionConflict)
    }
}
