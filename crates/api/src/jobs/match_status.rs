//! Minutely status sweep.
//!
//! Crosses the start and end boundaries for every due match in two bulk
//! updates. The status filters make a repeated or doubled sweep a no-op,
//! and the version bump inside the updates keeps the sweep honest against
//! concurrent user commands.

use std::sync::Arc;

use chrono::Utc;

use domain::services::GeoIndex;
use persistence::repositories::MatchRepository;

use super::scheduler::{Job, JobFrequency, LeaseSettings};
use crate::config::SchedulerConfig;

pub struct MatchStatusJob {
    matches: MatchRepository,
    geo_index: Arc<dyn GeoIndex + Send + Sync>,
    frequency_secs: u64,
    lock_at_least_secs: i64,
    lock_at_most_secs: i64,
}

impl MatchStatusJob {
    pub fn new(
        matches: MatchRepository,
        geo_index: Arc<dyn GeoIndex + Send + Sync>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            matches,
            geo_index,
            frequency_secs: config.status_sweep_secs,
            lock_at_least_secs: config.status_lock_at_least_secs,
            lock_at_most_secs: config.status_lock_at_most_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for MatchStatusJob {
    fn name(&self) -> &'static str {
        "match_status_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.frequency_secs)
    }

    fn lease(&self) -> Option<LeaseSettings> {
        Some(LeaseSettings {
            name: "match_status_sweep",
            lock_at_least: chrono::Duration::seconds(self.lock_at_least_secs),
            lock_at_most: chrono::Duration::seconds(self.lock_at_most_secs),
        })
    }

    async fn execute(&self) -> Result<(), String> {
        let now = Utc::now();

        let started = self
            .matches
            .start_due_matches(now)
            .await
            .map_err(|e| e.to_string())?;
        // A started match is no longer searchable; evict eagerly, the geo
        // sync repairs anything missed here.
        for match_id in &started {
            if let Err(err) = self.geo_index.remove(*match_id).await {
                tracing::warn!(match_id = %match_id, error = %err, "geo index eviction failed");
            }
        }

        let ended = self
            .matches
            .end_due_matches(now)
            .await
            .map_err(|e| e.to_string())?;

        if !started.is_empty() || !ended.is_empty() {
            crate::middleware::metrics::record_sweep_transitions(started.len(), ended.len());
            tracing::info!(
                started = started.len(),
                ended = ended.len(),
                "match status sweep applied transitions"
            );
        }
        Ok(())
    }
}
