//! Geo-index port and reconciliation planning.
//!
//! The geo index is a derived, eventually-consistent structure; the
//! relational store stays authoritative. The port is the whole contract:
//! nothing here depends on how the index stores points.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Error type for geo-index operations.
#[derive(Debug, Error)]
pub enum GeoIndexError {
    #[error("Geo index unavailable: {0}")]
    Unavailable(String),
}

/// One indexed match position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoEntry {
    pub match_id: Uuid,
    pub longitude: f64,
    pub latitude: f64,
}

/// Secondary spatial lookup structure for searchable matches.
#[async_trait]
pub trait GeoIndex: Send + Sync {
    /// Indexes a match position. Overwrites an existing entry for the id.
    async fn add(&self, entry: GeoEntry) -> Result<(), GeoIndexError>;

    /// Drops a match from the index. Removing an absent id is a no-op.
    async fn remove(&self, match_id: Uuid) -> Result<(), GeoIndexError>;

    /// Indexes a batch of positions (reconciliation repair path).
    async fn bulk_add(&self, entries: &[GeoEntry]) -> Result<(), GeoIndexError>;

    /// Full set of indexed match ids.
    async fn all_ids(&self) -> Result<HashSet<Uuid>, GeoIndexError>;

    /// Drops every entry.
    async fn clear(&self) -> Result<(), GeoIndexError>;

    /// Match ids within `radius_meters` of the given position.
    async fn search_within(
        &self,
        longitude: f64,
        latitude: f64,
        radius_meters: f64,
    ) -> Result<Vec<Uuid>, GeoIndexError>;
}

/// Repair actions needed to bring the index in line with the authoritative
/// searchable set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcilePlan {
    /// Searchable in the store, missing from the index.
    pub to_add: Vec<Uuid>,
    /// Present in the index, no longer searchable (orphans).
    pub to_remove: Vec<Uuid>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the set-difference repair plan between the authoritative
/// searchable ids and the currently indexed ids.
///
/// Safe against arbitrary drift: it only ever adds missing entries or
/// removes orphans, never touching the authoritative store.
pub fn reconcile_plan(authoritative: &HashSet<Uuid>, indexed: &HashSet<Uuid>) -> ReconcilePlan {
    let mut to_add: Vec<Uuid> = authoritative.difference(indexed).copied().collect();
    let mut to_remove: Vec<Uuid> = indexed.difference(authoritative).copied().collect();
    // Deterministic ordering keeps the repair log stable.
    to_add.sort_unstable();
    to_remove.sort_unstable();
    ReconcilePlan { to_add, to_remove }
}
