//! Match domain model and lifecycle rules.
//!
//! A `Match` is an immutable snapshot: every transition consumes the value
//! and returns the rebuilt next state, which the caller then persists under
//! an optimistic version check.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// How long after cancellation a match may still be reactivated.
pub const REACTIVATION_WINDOW_SECS: i64 = 3600;

/// Status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Pending,
    Confirmed,
    Full,
    InProgress,
    Ended,
    Cancelled,
}

impl MatchStatus {
    /// A searchable match appears in the geo index: anything prior to
    /// IN_PROGRESS and not cancelled.
    pub fn is_searchable(&self) -> bool {
        matches!(
            self,
            MatchStatus::Pending | MatchStatus::Confirmed | MatchStatus::Full
        )
    }

    /// A joinable match accepts new participation requests.
    pub fn is_joinable(&self) -> bool {
        matches!(self, MatchStatus::Pending | MatchStatus::Confirmed)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "PENDING"),
            MatchStatus::Confirmed => write!(f, "CONFIRMED"),
            MatchStatus::Full => write!(f, "FULL"),
            MatchStatus::InProgress => write!(f, "IN_PROGRESS"),
            MatchStatus::Ended => write!(f, "ENDED"),
            MatchStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A scheduled sports session with a capacity and a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    /// Optimistic-lock counter, bumped on every persisted write.
    pub version: i64,
    pub host_id: Uuid,
    /// Denormalized at creation; not refreshed when the user renames.
    pub host_name: String,
    pub title: String,
    pub description: Option<String>,
    /// Location snapshot copied at creation, not live-joined.
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub match_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_participants: i32,
    pub current_participants: i32,
    pub status: MatchStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied by the host while the match is still open.
#[derive(Debug, Clone, Default)]
pub struct MatchChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_participants: Option<i32>,
}

impl Match {
    /// Creates a new match. The host counts as the first participant.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        host_id: Uuid,
        host_name: String,
        title: String,
        description: Option<String>,
        latitude: f64,
        longitude: f64,
        address: String,
        match_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        max_participants: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 0,
            host_id,
            host_name,
            title,
            description,
            latitude,
            longitude,
            address,
            match_date,
            start_time,
            end_time,
            max_participants,
            current_participants: 1,
            status: MatchStatus::Pending,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Instant at which the match begins.
    pub fn starts_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.match_date.and_time(self.start_time))
    }

    /// Instant at which the match ends.
    pub fn ends_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.match_date.and_time(self.end_time))
    }

    /// Registers one confirmed participant.
    ///
    /// Does not re-check capacity: the caller must hold a fresh versioned
    /// read (or a row lock) and have validated `current < max` first.
    pub fn add_participant(mut self) -> Self {
        self.current_participants += 1;
        if self.current_participants >= self.max_participants {
            self.status = MatchStatus::Full;
        }
        self
    }

    /// Removes one confirmed participant. A FULL match reverts to PENDING.
    pub fn remove_participant(mut self) -> Self {
        self.current_participants = (self.current_participants - 1).max(0);
        if self.status == MatchStatus::Full {
            self.status = MatchStatus::Pending;
        }
        self
    }

    /// Cancels the match. Not allowed once it is underway or done.
    pub fn cancel(mut self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.status {
            MatchStatus::InProgress | MatchStatus::Ended | MatchStatus::Cancelled => {
                Err(DomainError::InvalidMatchTransition {
                    from: self.status,
                    action: "cancel",
                })
            }
            _ => {
                self.status = MatchStatus::Cancelled;
                self.cancelled_at = Some(now);
                Ok(self)
            }
        }
    }

    /// Reactivates a cancelled match within the reactivation window.
    pub fn reactivate(mut self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status != MatchStatus::Cancelled {
            return Err(DomainError::InvalidMatchTransition {
                from: self.status,
                action: "reactivate",
            });
        }
        let cancelled_at = self
            .cancelled_at
            .ok_or(DomainError::ReactivationWindowExpired)?;
        if now - cancelled_at > Duration::seconds(REACTIVATION_WINDOW_SECS) {
            return Err(DomainError::ReactivationWindowExpired);
        }
        if now >= self.starts_at() {
            return Err(DomainError::MatchDatePassed);
        }
        self.status = MatchStatus::Pending;
        self.cancelled_at = None;
        Ok(self)
    }

    /// Scheduler transition: the start boundary has been crossed.
    pub fn start(mut self) -> Result<Self, DomainError> {
        if !self.status.is_searchable() {
            return Err(DomainError::InvalidMatchTransition {
                from: self.status,
                action: "start",
            });
        }
        self.status = MatchStatus::InProgress;
        Ok(self)
    }

    /// Scheduler transition: the end boundary has been crossed.
    pub fn end(mut self) -> Result<Self, DomainError> {
        if self.status != MatchStatus::InProgress {
            return Err(DomainError::InvalidMatchTransition {
                from: self.status,
                action: "end",
            });
        }
        self.status = MatchStatus::Ended;
        Ok(self)
    }

    /// Applies a partial update and re-derives the capacity status.
    ///
    /// Shrinking the capacity down to the current count makes the match
    /// FULL; growing a FULL match past the current count reverts it to
    /// PENDING. Shrinking below the current count would break the capacity
    /// invariant and is rejected.
    pub fn update(mut self, changes: MatchChanges) -> Result<Self, DomainError> {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(match_date) = changes.match_date {
            self.match_date = match_date;
        }
        if let Some(start_time) = changes.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            self.end_time = end_time;
        }
        if self.start_time >= self.end_time {
            return Err(DomainError::EndBeforeStart);
        }
        if let Some(max_participants) = changes.max_participants {
            if max_participants < self.current_participants {
                return Err(DomainError::CapacityBelowCount {
                    requested: max_participants,
                    current: self.current_participants,
                });
            }
            self.max_participants = max_participants;
            if self.current_participants == self.max_participants {
                self.status = MatchStatus::Full;
            } else if self.status == MatchStatus::Full {
                self.status = MatchStatus::Pending;
            }
        }
        Ok(self)
    }

    /// Read-only view consumed by the participation validator.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            id: self.id,
            host_id: self.host_id,
            title: self.title.clone(),
            status: self.status,
            current_participants: self.current_participants,
            max_participants: self.max_participants,
            match_date: self.match_date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Flat view of a match used by participation logic.
///
/// The indirection lets participation rules be validated and tested without
/// importing the full match model or its persistence concerns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub status: MatchStatus,
    pub current_participants: i32,
    pub max_participants: i32,
    pub match_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl MatchSnapshot {
    pub fn starts_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.match_date.and_time(self.start_time))
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.match_date.and_time(self.end_time))
    }

    pub fn has_open_slot(&self) -> bool {
        self.current_participants < self.max_participants
    }
}

/// Request payload for creating a match.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    /// Location to snapshot coordinates and address from.
    pub location_id: Uuid,

    pub match_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,

    #[validate(custom(function = "shared::validation::validate_capacity"))]
    pub max_participants: i32,
}

/// Request payload for updating a match (partial update).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub match_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    #[validate(custom(function = "crate::models::sports_match::validate_optional_capacity"))]
    pub max_participants: Option<i32>,
}

impl From<UpdateMatchRequest> for MatchChanges {
    fn from(request: UpdateMatchRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            match_date: request.match_date,
            start_time: request.start_time,
            end_time: request.end_time,
            max_participants: request.max_participants,
        }
    }
}

/// Validates an optional capacity field.
pub fn validate_optional_capacity(capacity: i32) -> Result<(), validator::ValidationError> {
    shared::validation::validate_capacity(capacity)
}

/// Query parameters for the nearby-match search.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearbyMatchesQuery {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_radius_meters"))]
    pub radius_meters: f64,

    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: i64,
}

fn default_page_size() -> i64 {
    20
}

/// Response payload for match operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: Uuid,
    pub host_id: Uuid,
    pub host_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub match_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_participants: i32,
    pub current_participants: i32,
    pub status: MatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Match> for MatchResponse {
    fn from(m: Match) -> Self {
        Self {
            id: m.id,
            host_id: m.host_id,
            host_name: m.host_name,
            title: m.title,
            description: m.description,
            latitude: m.latitude,
            longitude: m.longitude,
            address: m.address,
            match_date: m.match_date,
            start_time: m.start_time,
            end_time: m.end_time,
            max_participants: m.max_participants,
            current_participants: m.current_participants,
            status: m.status,
            cancelled_at: m.cancelled_at,
            created_at: m.created_at,
        }
    }
}

/// Response for listing matches.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMatchesResponse {
    pub matches: Vec<MatchResponse>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(max_participants: i32) -> Match {
        Match::create(
            Uuid::new_v4(),
            "Jamie".to_string(),
            "Friday five-a-side".to_string(),
            None,
            37.5665,
            126.978,
            "12 Stadium Road".to_string(),
            NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            max_participants,
            Utc::now(),
        )
    }

    #[test]
    fn test_create_counts_host() {
        let m = sample_match(10);
        assert_eq!(m.current_participants, 1);
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.version, 0);
        assert!(m.cancelled_at.is_none());
    }

    #[test]
    fn test_add_participant_reaches_full() {
        let mut m = sample_match(4);
        for _ in 0..2 {
            m = m.add_participant();
            assert_eq!(m.status, MatchStatus::Pending);
        }
        m = m.add_participant();
        assert_eq!(m.current_participants, 4);
        assert_eq!(m.status, MatchStatus::Full);
    }

    #[test]
    fn test_capacity_invariant_holds_through_transitions() {
        let mut m = sample_match(5);
        for _ in 0..4 {
            m = m.add_participant();
            assert!(m.current_participants <= m.max_participants);
            assert!(m.current_participants >= 0);
        }
        assert_eq!(m.status, MatchStatus::Full);
        for _ in 0..4 {
            m = m.remove_participant();
            assert!(m.current_participants >= 0);
        }
        assert_eq!(m.current_participants, 1);
    }

    #[test]
    fn test_remove_participant_reverts_full_to_pending() {
        let m = sample_match(4)
            .add_participant()
            .add_participant()
            .add_participant();
        assert_eq!(m.status, MatchStatus::Full);

        let m = m.remove_participant();
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.current_participants, 3);
    }

    #[test]
    fn test_remove_participant_floors_at_zero() {
        let mut m = sample_match(4);
        m.current_participants = 0;
        let m = m.remove_participant();
        assert_eq!(m.current_participants, 0);
    }

    #[test]
    fn test_cancel_records_timestamp() {
        let now = Utc::now();
        let m = sample_match(6).cancel(now).unwrap();
        assert_eq!(m.status, MatchStatus::Cancelled);
        assert_eq!(m.cancelled_at, Some(now));
    }

    #[test]
    fn test_cancel_rejected_once_started() {
        let mut m = sample_match(6);
        m.status = MatchStatus::InProgress;
        let err = m.cancel(Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidMatchTransition {
                from: MatchStatus::InProgress,
                action: "cancel"
            }
        ));
    }

    #[test]
    fn test_cancel_rejected_when_already_cancelled() {
        let now = Utc::now();
        let m = sample_match(6).cancel(now).unwrap();
        assert!(m.cancel(now).is_err());
    }

    #[test]
    fn test_reactivate_within_window() {
        let cancelled_at = Utc::now();
        let m = sample_match(6).cancel(cancelled_at).unwrap();

        // 59m59s later is still inside the one-hour window.
        let m = m
            .reactivate(cancelled_at + Duration::seconds(3599))
            .unwrap();
        assert_eq!(m.status, MatchStatus::Pending);
        assert!(m.cancelled_at.is_none());
    }

    #[test]
    fn test_reactivate_after_window_fails() {
        let cancelled_at = Utc::now();
        let m = sample_match(6).cancel(cancelled_at).unwrap();

        let err = m
            .reactivate(cancelled_at + Duration::seconds(3601))
            .unwrap_err();
        assert_eq!(err, DomainError::ReactivationWindowExpired);
    }

    #[test]
    fn test_reactivate_requires_cancelled_status() {
        let m = sample_match(6);
        assert!(matches!(
            m.reactivate(Utc::now()).unwrap_err(),
            DomainError::InvalidMatchTransition { action: "reactivate", .. }
        ));
    }

    #[test]
    fn test_reactivate_fails_after_match_date() {
        let m = sample_match(6);
        let starts_at = m.starts_at();
        let m = m.cancel(starts_at - Duration::minutes(30)).unwrap();
        let err = m.reactivate(starts_at + Duration::minutes(1)).unwrap_err();
        assert_eq!(err, DomainError::MatchDatePassed);
    }

    #[test]
    fn test_start_from_searchable_statuses() {
        for status in [MatchStatus::Pending, MatchStatus::Confirmed, MatchStatus::Full] {
            let mut m = sample_match(6);
            m.status = status;
            assert_eq!(m.start().unwrap().status, MatchStatus::InProgress);
        }
    }

    #[test]
    fn test_start_is_not_repeatable() {
        let m = sample_match(6).start().unwrap();
        // A second sweep never sees it again; calling start anyway is a
        // state error, which is what makes the sweep idempotent.
        assert!(m.start().is_err());
    }

    #[test]
    fn test_end_requires_in_progress() {
        let m = sample_match(6);
        assert!(m.clone().end().is_err());
        let m = m.start().unwrap().end().unwrap();
        assert_eq!(m.status, MatchStatus::Ended);
        assert!(m.end().is_err());
    }

    #[test]
    fn test_update_shrink_to_count_goes_full() {
        let m = sample_match(8).add_participant().add_participant();
        let m = m
            .update(MatchChanges {
                max_participants: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(m.status, MatchStatus::Full);
        assert_eq!(m.max_participants, 3);
    }

    #[test]
    fn test_update_below_count_rejected() {
        let m = sample_match(8).add_participant().add_participant();
        let err = m
            .update(MatchChanges {
                max_participants: Some(2),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::CapacityBelowCount {
                requested: 2,
                current: 3
            }
        ));
    }

    #[test]
    fn test_update_grow_reverts_full_to_pending() {
        let m = sample_match(2).add_participant();
        assert_eq!(m.status, MatchStatus::Full);
        let m = m
            .update(MatchChanges {
                max_participants: Some(10),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(m.status, MatchStatus::Pending);
    }

    #[test]
    fn test_update_rejects_inverted_times() {
        let m = sample_match(8);
        let err = m
            .update(MatchChanges {
                start_time: Some(NaiveTime::from_hms_opt(22, 0, 0).unwrap()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, DomainError::EndBeforeStart);
    }

    #[test]
    fn test_update_fields() {
        let m = sample_match(8)
            .update(MatchChanges {
                title: Some("Saturday kickabout".to_string()),
                description: Some("Bring both kits".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(m.title, "Saturday kickabout");
        assert_eq!(m.description.as_deref(), Some("Bring both kits"));
    }

    #[test]
    fn test_snapshot_mirrors_match() {
        let m = sample_match(8);
        let s = m.snapshot();
        assert_eq!(s.id, m.id);
        assert_eq!(s.host_id, m.host_id);
        assert_eq!(s.current_participants, 1);
        assert_eq!(s.starts_at(), m.starts_at());
        assert!(s.has_open_slot());
    }

    #[test]
    fn test_status_searchable_set() {
        assert!(MatchStatus::Pending.is_searchable());
        assert!(MatchStatus::Confirmed.is_searchable());
        assert!(MatchStatus::Full.is_searchable());
        assert!(!MatchStatus::InProgress.is_searchable());
        assert!(!MatchStatus::Ended.is_searchable());
        assert!(!MatchStatus::Cancelled.is_searchable());
    }

    #[test]
    fn test_status_joinable_set() {
        assert!(MatchStatus::Pending.is_joinable());
        assert!(MatchStatus::Confirmed.is_joinable());
        assert!(!MatchStatus::Full.is_joinable());
        assert!(!MatchStatus::Cancelled.is_joinable());
    }

    #[test]
    fn test_create_match_request_validation() {
        let request = CreateMatchRequest {
            title: "Sunday futsal".to_string(),
            description: None,
            location_id: Uuid::new_v4(),
            match_date: NaiveDate::from_ymd_opt(2026, 9, 6).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            max_participants: 10,
        };
        assert!(request.validate().is_ok());

        let too_small = CreateMatchRequest {
            max_participants: 3,
            ..request
        };
        assert!(too_small.validate().is_err());
    }

    #[test]
    fn test_match_response_serialization() {
        let response = MatchResponse::from(sample_match(10));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"PENDING\""));
        assert!(json.contains("\"maxParticipants\":10"));
        assert!(json.contains("\"currentParticipants\":1"));
        // Skips absent optional fields.
        assert!(!json.contains("\"cancelledAt\""));
        assert!(!json.contains("\"description\""));
    }
}
