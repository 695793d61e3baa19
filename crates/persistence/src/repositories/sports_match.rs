//! Match repository implementation.
//!
//! Every write that follows a read goes through `update`, which compares
//! the version read against the row and bumps it on success. A zero-row
//! update means someone else won the race; the caller decides whether to
//! retry the whole command.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use domain::models::Match;
use domain::services::GeoEntry;

use crate::entities::{MatchEntity, MatchStatusDb};
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;

/// Repository for match database operations.
#[derive(Clone)]
pub struct MatchRepository {
    pool: PgPool,
}

impl MatchRepository {
    /// Creates a new match repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a freshly created match inside the given transaction.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        m: &Match,
    ) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("insert_match");
        sqlx::query(
            r#"
            INSERT INTO matches (
                id, version, host_id, host_name, title, description,
                latitude, longitude, address,
                match_date, start_time, end_time,
                max_participants, current_participants, status,
                cancelled_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(m.id)
        .bind(m.version)
        .bind(m.host_id)
        .bind(&m.host_name)
        .bind(&m.title)
        .bind(&m.description)
        .bind(m.latitude)
        .bind(m.longitude)
        .bind(&m.address)
        .bind(m.match_date)
        .bind(m.start_time)
        .bind(m.end_time)
        .bind(m.max_participants)
        .bind(m.current_participants)
        .bind(MatchStatusDb::from(m.status))
        .bind(m.cancelled_at)
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&mut **tx)
        .await?;
        timer.record();
        Ok(())
    }

    /// Finds a match by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>, RepositoryError> {
        let timer = QueryTimer::new("find_match_by_id");
        let entity = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT * FROM matches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        timer.record();
        Ok(entity.map(Match::from))
    }

    /// Finds a match by id inside a transaction.
    ///
    /// Capacity-affecting reads must happen here so the version check at
    /// commit protects them.
    pub async fn find_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Match>, RepositoryError> {
        let entity = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT * FROM matches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(entity.map(Match::from))
    }

    /// Finds a match by id with a pessimistic row lock (approve path).
    ///
    /// The lock is held until the transaction commits, bounding the
    /// capacity re-check against concurrent approvals.
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Match>, RepositoryError> {
        let entity = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT * FROM matches
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(entity.map(Match::from))
    }

    /// Persists a mutated match snapshot under the optimistic version check.
    ///
    /// Returns the stored state with the bumped version, or
    /// `RepositoryError::StaleVersion` when the row changed since the
    /// snapshot was read.
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        m: &Match,
    ) -> Result<Match, RepositoryError> {
        let timer = QueryTimer::new("update_match");
        let entity = sqlx::query_as::<_, MatchEntity>(
            r#"
            UPDATE matches
            SET
                title = $3,
                description = $4,
                match_date = $5,
                start_time = $6,
                end_time = $7,
                max_participants = $8,
                current_participants = $9,
                status = $10,
                cancelled_at = $11,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(m.id)
        .bind(m.version)
        .bind(&m.title)
        .bind(&m.description)
        .bind(m.match_date)
        .bind(m.start_time)
        .bind(m.end_time)
        .bind(m.max_participants)
        .bind(m.current_participants)
        .bind(MatchStatusDb::from(m.status))
        .bind(m.cancelled_at)
        .fetch_optional(&mut **tx)
        .await?;
        timer.record();
        entity.map(Match::from).ok_or(RepositoryError::StaleVersion)
    }

    /// Lists matches hosted by a user, newest first.
    pub async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Match>, RepositoryError> {
        let timer = QueryTimer::new("list_matches_by_host");
        let entities = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT * FROM matches
            WHERE host_id = $1
            ORDER BY match_date DESC, start_time DESC
            "#,
        )
        .bind(host_id)
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(entities.into_iter().map(Match::from).collect())
    }

    /// Loads matches by id set (hydrates geo search hits).
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Match>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let timer = QueryTimer::new("find_matches_by_ids");
        let entities = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT * FROM matches
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(entities.into_iter().map(Match::from).collect())
    }

    /// Moves every searchable match whose start boundary has passed into
    /// IN_PROGRESS, returning the transitioned ids.
    ///
    /// The status filter makes repeated sweeps idempotent, and the version
    /// bump keeps the sweep on the same write path user commands race
    /// against.
    pub async fn start_due_matches(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        let timer = QueryTimer::new("start_due_matches");
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE matches
            SET status = 'IN_PROGRESS', version = version + 1, updated_at = NOW()
            WHERE status IN ('PENDING', 'CONFIRMED', 'FULL')
              AND (match_date + start_time) <= $1
            RETURNING id
            "#,
        )
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Moves every in-progress match whose end boundary has passed into
    /// ENDED, returning the transitioned ids.
    pub async fn end_due_matches(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, RepositoryError> {
        let timer = QueryTimer::new("end_due_matches");
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE matches
            SET status = 'ENDED', version = version + 1, updated_at = NOW()
            WHERE status = 'IN_PROGRESS'
              AND (match_date + end_time) <= $1
            RETURNING id
            "#,
        )
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Authoritative set of searchable match ids (reconciliation input).
    pub async fn searchable_ids(&self) -> Result<HashSet<Uuid>, RepositoryError> {
        let timer = QueryTimer::new("searchable_match_ids");
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM matches
            WHERE status IN ('PENDING', 'CONFIRMED', 'FULL')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Positions of every searchable match (reconciliation repair input).
    pub async fn searchable_entries(&self) -> Result<Vec<GeoEntry>, RepositoryError> {
        let timer = QueryTimer::new("searchable_match_entries");
        let rows: Vec<(Uuid, f64, f64)> = sqlx::query_as(
            r#"
            SELECT id, longitude, latitude FROM matches
            WHERE status IN ('PENDING', 'CONFIRMED', 'FULL')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(rows
            .into_iter()
            .map(|(match_id, longitude, latitude)| GeoEntry {
                match_id,
                longitude,
                latitude,
            })
            .collect())
    }
}
