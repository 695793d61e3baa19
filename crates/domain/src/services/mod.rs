//! Domain services and ports.

pub mod geo_index;
pub mod participation_rules;
pub mod providers;

pub use geo_index::{reconcile_plan, GeoEntry, GeoIndex, GeoIndexError, ReconcilePlan};
pub use providers::{LocationProvider, LocationSnapshot, ProviderError, UserDirectory};
