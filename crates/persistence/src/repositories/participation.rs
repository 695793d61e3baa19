//! Participation repository implementation.

use chrono::{NaiveDateTime, TimeZone, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use domain::models::Participation;
use domain::services::participation_rules::ActiveCommitment;

use crate::entities::{ParticipationEntity, ParticipationStatusDb};
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;

/// Repository for participation database operations.
#[derive(Clone)]
pub struct ParticipationRepository {
    pool: PgPool,
}

impl ParticipationRepository {
    /// Creates a new participation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new participation inside the given transaction.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        p: &Participation,
    ) -> Result<(), RepositoryError> {
        let timer = QueryTimer::new("insert_participation");
        sqlx::query(
            r#"
            INSERT INTO participations (
                id, version, match_id, user_id, status, joined_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(p.id)
        .bind(p.version)
        .bind(p.match_id)
        .bind(p.user_id)
        .bind(ParticipationStatusDb::from(p.status))
        .bind(p.joined_at)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&mut **tx)
        .await?;
        timer.record();
        Ok(())
    }

    /// Persists a mutated participation under the optimistic version check.
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        p: &Participation,
    ) -> Result<Participation, RepositoryError> {
        let timer = QueryTimer::new("update_participation");
        let entity = sqlx::query_as::<_, ParticipationEntity>(
            r#"
            UPDATE participations
            SET
                status = $3,
                joined_at = $4,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(p.version)
        .bind(ParticipationStatusDb::from(p.status))
        .bind(p.joined_at)
        .fetch_optional(&mut **tx)
        .await?;
        timer.record();
        entity
            .map(Participation::from)
            .ok_or(RepositoryError::StaleVersion)
    }

    /// Finds a participation by id inside a transaction.
    pub async fn find_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Participation>, RepositoryError> {
        let entity = sqlx::query_as::<_, ParticipationEntity>(
            r#"
            SELECT * FROM participations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(entity.map(Participation::from))
    }

    /// The user's participation record for a match, if any.
    ///
    /// At most one row exists per (match, user) pair; a cancelled record is
    /// reactivated on re-join rather than duplicated.
    pub async fn find_by_match_and_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        match_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participation>, RepositoryError> {
        let entity = sqlx::query_as::<_, ParticipationEntity>(
            r#"
            SELECT * FROM participations
            WHERE match_id = $1 AND user_id = $2
            "#,
        )
        .bind(match_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(entity.map(Participation::from))
    }

    /// Time windows of every match the user is actively committed to
    /// (PENDING or CONFIRMED participation), for the overlap check.
    pub async fn active_commitments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Vec<ActiveCommitment>, RepositoryError> {
        let timer = QueryTimer::new("active_commitments");
        let rows: Vec<(Uuid, NaiveDateTime, NaiveDateTime)> = sqlx::query_as(
            r#"
            SELECT m.id,
                   (m.match_date + m.start_time) AS starts_at,
                   (m.match_date + m.end_time) AS ends_at
            FROM participations p
            JOIN matches m ON m.id = p.match_id
            WHERE p.user_id = $1 AND p.status IN ('PENDING', 'CONFIRMED')
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await?;
        timer.record();
        Ok(rows
            .into_iter()
            .map(|(match_id, starts_at, ends_at)| ActiveCommitment {
                match_id,
                starts_at: Utc.from_utc_datetime(&starts_at),
                ends_at: Utc.from_utc_datetime(&ends_at),
            })
            .collect())
    }

    /// Roster of a match excluding cancelled participations, oldest first.
    pub async fn list_by_match_excluding_cancelled(
        &self,
        match_id: Uuid,
    ) -> Result<Vec<Participation>, RepositoryError> {
        let timer = QueryTimer::new("list_participations_by_match");
        let entities = sqlx::query_as::<_, ParticipationEntity>(
            r#"
            SELECT * FROM participations
            WHERE match_id = $1 AND status <> 'CANCELLED'
            ORDER BY joined_at ASC
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;
        timer.record();
        Ok(entities.into_iter().map(Participation::from).collect())
    }
}
