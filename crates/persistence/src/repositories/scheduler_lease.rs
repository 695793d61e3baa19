//! Scheduler lease repository.
//!
//! Cluster-wide mutual exclusion for background jobs: a named lease row
//! with acquire-or-skip semantics. An instance that fails to acquire skips
//! the tick instead of blocking. `lock_at_most_until` caps how long a
//! crashed holder can keep the lease.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::error::RepositoryError;
use crate::metrics::QueryTimer;

/// Repository for scheduler lease operations.
#[derive(Clone)]
pub struct SchedulerLeaseRepository {
    pool: PgPool,
}

impl SchedulerLeaseRepository {
    /// Creates a new scheduler lease repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attempts to acquire the named lease.
    ///
    /// Succeeds when no row exists or the previous lease has expired.
    /// Returns `false` (skip the tick) when another instance holds it.
    pub async fn try_acquire(
        &self,
        name: &str,
        lock_at_least_for: Duration,
        lock_at_most_for: Duration,
    ) -> Result<bool, RepositoryError> {
        let timer = QueryTimer::new("lease_try_acquire");
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO scheduler_leases (name, locked_at, lock_at_least_until, locked_until)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET locked_at = EXCLUDED.locked_at,
                lock_at_least_until = EXCLUDED.lock_at_least_until,
                locked_until = EXCLUDED.locked_until
            WHERE scheduler_leases.locked_until <= EXCLUDED.locked_at
            "#,
        )
        .bind(name)
        .bind(now)
        .bind(now + lock_at_least_for)
        .bind(now + lock_at_most_for)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() == 1)
    }

    /// Releases the named lease.
    ///
    /// The expiry is clamped to `lock_at_least_until`, so a sweep that
    /// finishes quickly still suppresses a double-fire near the tick
    /// boundary on another instance.
    pub async fn release(&self, name: &str) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("lease_release");
        sqlx::query(
            r#"
            UPDATE scheduler_leases
            SET locked_until = GREATEST(lock_at_least_until, $2)
            WHERE name = $1
            "#,
        )
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(())
    }
}
