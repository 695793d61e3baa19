//! Background job scheduler and job implementations.

mod geo_sync;
mod match_status;
mod pool_metrics;
mod scheduler;

pub use geo_sync::GeoSyncJob;
pub use match_status::MatchStatusJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler, LeaseSettings, LeaseStore};
