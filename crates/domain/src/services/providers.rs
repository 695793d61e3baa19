//! Ports for external collaborators: user identity and locations.
//!
//! Both are consumed at their interface boundary only. The directory is
//! queried when a match is created (host existence and display name); the
//! location provider supplies the coordinate snapshot copied into the
//! match.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Error type for provider lookups.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the user base.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Display name of a user, if the user exists.
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, ProviderError>;

    /// Whether a user exists.
    async fn exists(&self, user_id: Uuid) -> Result<bool, ProviderError>;
}

/// Coordinates and address copied into a match at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Read-only view of registered locations.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Location snapshot by id, if the location exists.
    async fn find(&self, location_id: Uuid) -> Result<Option<LocationSnapshot>, ProviderError>;
}
