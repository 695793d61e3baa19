//! Match command and query orchestration.
//!
//! Writes commit to Postgres first; the geo index is updated after the
//! commit and only best-effort. A failed index write is logged and left
//! for the hourly reconciliation to repair, so search may briefly serve
//! stale entries but never blocks a command.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{
    CreateMatchRequest, ListMatchesResponse, Match, MatchResponse, NearbyMatchesQuery,
    UpdateMatchRequest,
};
use domain::services::{GeoEntry, GeoIndex, LocationProvider, UserDirectory};
use persistence::repositories::MatchRepository;
use shared::pagination::{decode_cursor, encode_cursor};

use crate::services::retry::{with_version_retry, RetryPolicy};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct MatchService {
    pool: PgPool,
    matches: MatchRepository,
    users: Arc<dyn UserDirectory + Send + Sync>,
    locations: Arc<dyn LocationProvider + Send + Sync>,
    geo_index: Arc<dyn GeoIndex + Send + Sync>,
    retry: RetryPolicy,
}

impl MatchService {
    pub fn new(
        pool: PgPool,
        matches: MatchRepository,
        users: Arc<dyn UserDirectory + Send + Sync>,
        locations: Arc<dyn LocationProvider + Send + Sync>,
        geo_index: Arc<dyn GeoIndex + Send + Sync>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            matches,
            users,
            locations,
            geo_index,
            retry,
        }
    }

    /// Creates a match hosted by `host_id`, snapshotting the host name and
    /// the location coordinates at creation time.
    pub async fn create(
        &self,
        host_id: Uuid,
        request: CreateMatchRequest,
    ) -> Result<Match, ServiceError> {
        let host_name = self
            .users
            .display_name(host_id)
            .await?
            .ok_or(DomainError::UserNotFound(host_id))?;
        let location = self
            .locations
            .find(request.location_id)
            .await?
            .ok_or(DomainError::LocationNotFound(request.location_id))?;

        let m = Match::create(
            host_id,
            host_name,
            request.title,
            request.description,
            location.latitude,
            location.longitude,
            location.address,
            request.match_date,
            request.start_time,
            request.end_time,
            request.max_participants,
            Utc::now(),
        );

        let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
        self.matches.insert(&mut tx, &m).await?;
        tx.commit().await.map_err(ServiceError::Database)?;

        self.index_entry(&m).await;
        Ok(m)
    }

    /// Loads a single match.
    pub async fn get(&self, match_id: Uuid) -> Result<Match, ServiceError> {
        self.matches
            .find_by_id(match_id)
            .await?
            .ok_or_else(|| DomainError::MatchNotFound(match_id).into())
    }

    /// Applies a host edit under the optimistic retry loop.
    pub async fn update(
        &self,
        match_id: Uuid,
        caller_id: Uuid,
        request: UpdateMatchRequest,
    ) -> Result<Match, ServiceError> {
        with_version_retry(self.retry, || {
            let request = request.clone();
            async move { self.try_update(match_id, caller_id, request).await }
        })
        .await
    }

    async fn try_update(
        &self,
        match_id: Uuid,
        caller_id: Uuid,
        request: UpdateMatchRequest,
    ) -> Result<Match, ServiceError> {
        let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
        let m = self
            .matches
            .find_by_id_tx(&mut tx, match_id)
            .await?
            .ok_or(DomainError::MatchNotFound(match_id))?;
        self.require_host(&m, caller_id)?;
        if !m.status.is_searchable() {
            return Err(DomainError::MatchNotUpdatable(m.status).into());
        }

        let updated = m.update(request.into())?;
        let stored = self.matches.update(&mut tx, &updated).await?;
        tx.commit().await.map_err(ServiceError::Database)?;
        Ok(stored)
    }

    /// Cancels a match on behalf of its host.
    pub async fn cancel(&self, match_id: Uuid, caller_id: Uuid) -> Result<Match, ServiceError> {
        let stored = with_version_retry(self.retry, || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
            let m = self
                .matches
                .find_by_id_tx(&mut tx, match_id)
                .await?
                .ok_or(DomainError::MatchNotFound(match_id))?;
            self.require_host(&m, caller_id)?;

            let cancelled = m.cancel(Utc::now())?;
            let stored = self.matches.update(&mut tx, &cancelled).await?;
            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(stored)
        })
        .await?;

        // Write-through removal; reconciliation covers a miss here.
        if let Err(err) = self.geo_index.remove(stored.id).await {
            tracing::warn!(match_id = %stored.id, error = %err, "geo index removal failed");
        }
        Ok(stored)
    }

    /// Reactivates a cancelled match within its reactivation window.
    pub async fn reactivate(&self, match_id: Uuid, caller_id: Uuid) -> Result<Match, ServiceError> {
        let stored = with_version_retry(self.retry, || async move {
            let mut tx = self.pool.begin().await.map_err(ServiceError::Database)?;
            let m = self
                .matches
                .find_by_id_tx(&mut tx, match_id)
                .await?
                .ok_or(DomainError::MatchNotFound(match_id))?;
            self.require_host(&m, caller_id)?;

            let reactivated = m.reactivate(Utc::now())?;
            let stored = self.matches.update(&mut tx, &reactivated).await?;
            tx.commit().await.map_err(ServiceError::Database)?;
            Ok(stored)
        })
        .await?;

        self.index_entry(&stored).await;
        Ok(stored)
    }

    /// Lists matches hosted by the caller, newest first.
    pub async fn list_by_host(&self, host_id: Uuid) -> Result<Vec<Match>, ServiceError> {
        Ok(self.matches.list_by_host(host_id).await?)
    }

    /// Radius search served from the geo index, hydrated from Postgres.
    ///
    /// The index orders hits nearest-first and that order is stable across
    /// pages, so the cursor is just the rank of the last returned hit. A
    /// hit whose row is no longer searchable is dropped at hydration.
    pub async fn nearby(
        &self,
        query: NearbyMatchesQuery,
    ) -> Result<ListMatchesResponse, ServiceError> {
        let hits = self
            .geo_index
            .search_within(query.longitude, query.latitude, query.radius_meters)
            .await?;
        let total = hits.len();

        let offset = match &query.cursor {
            Some(cursor) => {
                let (rank, _) = decode_cursor(cursor)
                    .map_err(|e| ServiceError::Domain(DomainError::InvalidCursor(e.to_string())))?;
                (rank as usize).saturating_add(1)
            }
            None => 0,
        };

        let page: Vec<Uuid> = hits
            .iter()
            .skip(offset)
            .take(query.limit as usize)
            .copied()
            .collect();
        let next_cursor = if offset + page.len() < total {
            page.last()
                .map(|id| encode_cursor((offset + page.len() - 1) as u64, *id))
        } else {
            None
        };

        let rows = self.matches.find_by_ids(&page).await?;
        let mut by_id: std::collections::HashMap<Uuid, Match> = rows
            .into_iter()
            .filter(|m| m.status.is_searchable())
            .map(|m| (m.id, m))
            .collect();
        let matches: Vec<MatchResponse> = page
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(MatchResponse::from)
            .collect();

        Ok(ListMatchesResponse {
            matches,
            total,
            next_cursor,
        })
    }

    fn require_host(&self, m: &Match, caller_id: Uuid) -> Result<(), DomainError> {
        if m.host_id != caller_id {
            return Err(DomainError::NotMatchHost {
                match_id: m.id,
                user_id: caller_id,
            });
        }
        Ok(())
    }

    async fn index_entry(&self, m: &Match) {
        let entry = GeoEntry {
            match_id: m.id,
            longitude: m.longitude,
            latitude: m.latitude,
        };
        if let Err(err) = self.geo_index.add(entry).await {
            tracing::warn!(match_id = %m.id, error = %err, "geo index write failed");
        }
    }
}
