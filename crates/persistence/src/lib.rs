//! Persistence layer for the Matchday backend.
//!
//! Contains the Postgres repositories (optimistic-version writes for
//! matches and participations, the scheduler lease store, read-only
//! provider lookups), the row-mapping entities, and the in-memory geo
//! index implementation.

pub mod db;
pub mod entities;
pub mod error;
pub mod geo_index;
pub mod metrics;
pub mod repositories;

pub use error::RepositoryError;
