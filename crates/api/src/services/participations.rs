//! Participation command orchestration.
//!
//! Every command runs under the optimistic retry loop; a version conflict
//! on either the match or the participation row restarts the whole command
//! against fresh state, so a lost race resolves into the correct domain
//! error on re-read instead of a conflict response. Approval additionally
//! takes a row lock on the match, so two approvals into the last slot
//! serialize on the database.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{Match, Participation};
use domain::services::participation_rules::{
    validate_approve, validate_cancel, validate_join, validate_reject,
};
use persistence::repositories::{MatchRepository, ParticipationRepository};

use crate::services::retry::{with_version_retry, RetryPolicy};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct ParticipationService {
    pool: PgPool,
    matches: MatchRepository,
    participations: ParticipationRepository,
    retry: RetryPolicy,
}

impl ParticipationService {
    pub fn new(
        pool: PgPool,
        matches: MatchRepository,
        participations: ParticipationRepository,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            matches,
            participations,
            retry,
        }
    }

    /// Requests to join a match. The participation starts PENDING and does
    /// not consume a slot until the host approves it.
    pub async fn join(&self, match_id: Uuid, user_id: Uuid) -> Result<Participation, ServiceError> {
        with_version_retry(self.retry, || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
            let m = self
                .matches
                .find_by_id_tx(&mut tx, match_id)
                .await?
                .ok_or(DomainError::MatchNotFound(match_id))?;
            let existing = self
                .participations
                .find_by_match_and_user(&mut tx, match_id, user_id)
                .await?;
            let commitments = self
                .participations
                .active_commitments(&mut tx, user_id)
                .await?;

            validate_join(&m.snapshot(), user_id, existing.as_ref(), &commitments)?;

            let stored = match existing {
                // Cancelled history: reactivate the row rather than violate
                // the (match, user) uniqueness. Rejection is terminal and
                // surfaces as an invalid transition here.
                Some(previous) => {
                    let rejoined = previous.reactivate(Utc::now())?;
                    self.participations.update(&mut tx, &rejoined).await?
                }
                None => {
                    let p = Participation::join(match_id, user_id, Utc::now());
                    self.participations.insert(&mut tx, &p).await?;
                    p
                }
            };
            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(stored)
        })
        .await
    }

    /// Cancels the caller's confirmed participation in a match, releasing
    /// its slot.
    pub async fn cancel(
        &self,
        match_id: Uuid,
        user_id: Uuid,
    ) -> Result<Participation, ServiceError> {
        with_version_retry(self.retry, || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
            let m = self
                .matches
                .find_by_id_tx(&mut tx, match_id)
                .await?
                .ok_or(DomainError::MatchNotFound(match_id))?;
            let p = self
                .participations
                .find_by_match_and_user(&mut tx, match_id, user_id)
                .await?
                .ok_or(DomainError::ParticipationMissing { match_id, user_id })?;

            validate_cancel(&m.snapshot(), &p, user_id, Utc::now())?;

            let cancelled = p.cancel()?;
            let stored = self.participations.update(&mut tx, &cancelled).await?;
            // Only a confirmed participation held a slot, and validate_cancel
            // guaranteed that just above.
            self.matches.update(&mut tx, &m.remove_participant()).await?;
            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(stored)
        })
        .await
    }

    /// Host approval of a pending request. Consumes a slot.
    ///
    /// The match row is read `FOR UPDATE`; the capacity re-check and the
    /// increment happen under that lock.
    pub async fn approve(
        &self,
        participation_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Participation, ServiceError> {
        with_version_retry(self.retry, || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
            let p = self
                .participations
                .find_by_id_tx(&mut tx, participation_id)
                .await?
                .ok_or(DomainError::ParticipationNotFound(participation_id))?;
            let m = self
                .matches
                .find_by_id_for_update(&mut tx, p.match_id)
                .await?
                .ok_or(DomainError::MatchNotFound(p.match_id))?;

            validate_approve(&m.snapshot(), &p, caller_id)?;

            let approved = p.approve()?;
            let stored = self.participations.update(&mut tx, &approved).await?;
            self.matches.update(&mut tx, &m.add_participant()).await?;
            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(stored)
        })
        .await
    }

    /// Host rejection of a pending request. Never touches the slot count.
    pub async fn reject(
        &self,
        participation_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Participation, ServiceError> {
        with_version_retry(self.retry, || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
            let p = self
                .participations
                .find_by_id_tx(&mut tx, participation_id)
                .await?
                .ok_or(DomainError::ParticipationNotFound(participation_id))?;
            let m = self
                .matches
                .find_by_id_tx(&mut tx, p.match_id)
                .await?
                .ok_or(DomainError::MatchNotFound(p.match_id))?;

            validate_reject(&m.snapshot(), &p, caller_id)?;

            let rejected = p.reject()?;
            let stored = self.participations.update(&mut tx, &rejected).await?;
            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(stored)
        })
        .await
    }

    /// Roster of a match: everything except cancelled records.
    pub async fn roster(&self, match_id: Uuid) -> Result<Vec<Participation>, ServiceError> {
        let _: Match = self
            .matches
            .find_by_id(match_id)
            .await?
            .ok_or(DomainError::MatchNotFound(match_id))?;
        Ok(self
            .participations
            .list_by_match_excluding_cancelled(match_id)
            .await?)
    }
}
