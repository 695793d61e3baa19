//! Hourly geo index reconciliation.
//!
//! The relational store is authoritative; write-through keeps the index
//! close, and this job closes whatever gap is left (missed evictions,
//! failed writes, an index warmed from a stale snapshot). Both repair
//! directions are computed as a set difference and applied in bulk.

use std::sync::Arc;

use domain::services::{reconcile_plan, GeoIndex};
use persistence::repositories::MatchRepository;

use super::scheduler::{Job, JobFrequency, LeaseSettings};
use crate::config::SchedulerConfig;

pub struct GeoSyncJob {
    matches: MatchRepository,
    geo_index: Arc<dyn GeoIndex + Send + Sync>,
    frequency_secs: u64,
    lock_at_least_secs: i64,
    lock_at_most_secs: i64,
}

impl GeoSyncJob {
    pub fn new(
        matches: MatchRepository,
        geo_index: Arc<dyn GeoIndex + Send + Sync>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            matches,
            geo_index,
            frequency_secs: config.geo_sync_secs,
            lock_at_least_secs: config.geo_lock_at_least_secs,
            lock_at_most_secs: config.geo_lock_at_most_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for GeoSyncJob {
    fn name(&self) -> &'static str {
        "geo_index_sync"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.frequency_secs)
    }

    fn lease(&self) -> Option<LeaseSettings> {
        Some(LeaseSettings {
            name: "geo_index_sync",
            lock_at_least: chrono::Duration::seconds(self.lock_at_least_secs),
            lock_at_most: chrono::Duration::seconds(self.lock_at_most_secs),
        })
    }

    async fn execute(&self) -> Result<(), String> {
        let entries = self
            .matches
            .searchable_entries()
            .await
            .map_err(|e| e.to_string())?;
        let authoritative = entries.iter().map(|e| e.match_id).collect();
        let indexed = self.geo_index.all_ids().await.map_err(|e| e.to_string())?;

        let plan = reconcile_plan(&authoritative, &indexed);
        if plan.is_empty() {
            tracing::debug!("geo index already consistent");
            return Ok(());
        }

        let missing: Vec<_> = entries
            .iter()
            .filter(|e| plan.to_add.contains(&e.match_id))
            .cloned()
            .collect();
        self.geo_index
            .bulk_add(&missing)
            .await
            .map_err(|e| e.to_string())?;
        for match_id in &plan.to_remove {
            self.geo_index
                .remove(*match_id)
                .await
                .map_err(|e| e.to_string())?;
        }

        tracing::info!(
            added = plan.to_add.len(),
            removed = plan.to_remove.len(),
            "geo index drift repaired"
        );
        Ok(())
    }
}
