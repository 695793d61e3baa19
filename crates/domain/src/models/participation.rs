//! Participation domain model and lifecycle rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Status of a participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl ParticipationStatus {
    /// Active participations block duplicate joins and overlapping
    /// commitments.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ParticipationStatus::Pending | ParticipationStatus::Confirmed
        )
    }
}

impl std::fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipationStatus::Pending => write!(f, "PENDING"),
            ParticipationStatus::Confirmed => write!(f, "CONFIRMED"),
            ParticipationStatus::Rejected => write!(f, "REJECTED"),
            ParticipationStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A user's enrollment record against a specific match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participation {
    pub id: Uuid,
    /// Optimistic-lock counter, bumped on every persisted write.
    pub version: i64,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipationStatus,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participation {
    /// Creates a new join request awaiting host approval.
    pub fn join(match_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 0,
            match_id,
            user_id,
            status: ParticipationStatus::Pending,
            joined_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Host approval: PENDING becomes CONFIRMED.
    pub fn approve(mut self) -> Result<Self, DomainError> {
        if self.status != ParticipationStatus::Pending {
            return Err(DomainError::InvalidParticipationTransition {
                from: self.status,
                action: "approve",
            });
        }
        self.status = ParticipationStatus::Confirmed;
        Ok(self)
    }

    /// Host rejection: PENDING becomes REJECTED.
    pub fn reject(mut self) -> Result<Self, DomainError> {
        if self.status != ParticipationStatus::Pending {
            return Err(DomainError::InvalidParticipationTransition {
                from: self.status,
                action: "reject",
            });
        }
        self.status = ParticipationStatus::Rejected;
        Ok(self)
    }

    /// Only a confirmed participation may be cancelled by its owner.
    pub fn can_cancel(&self) -> bool {
        self.status == ParticipationStatus::Confirmed
    }

    /// Owner cancellation: CONFIRMED becomes CANCELLED.
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        if !self.can_cancel() {
            return Err(DomainError::InvalidParticipationTransition {
                from: self.status,
                action: "cancel",
            });
        }
        self.status = ParticipationStatus::Cancelled;
        Ok(self)
    }

    /// Re-joining after cancellation reactivates the existing record
    /// instead of duplicating the (match, user) pair.
    pub fn reactivate(mut self, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status != ParticipationStatus::Cancelled {
            return Err(DomainError::InvalidParticipationTransition {
                from: self.status,
                action: "reactivate",
            });
        }
        self.status = ParticipationStatus::Pending;
        self.joined_at = now;
        Ok(self)
    }
}

/// Response payload for participation operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationResponse {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipationStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<Participation> for ParticipationResponse {
    fn from(p: Participation) -> Self {
        Self {
            id: p.id,
            match_id: p.match_id,
            user_id: p.user_id,
            status: p.status,
            joined_at: p.joined_at,
        }
    }
}

/// Response for listing the participations of a match.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParticipationsResponse {
    pub participations: Vec<ParticipationResponse>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_participation() -> Participation {
        Participation::join(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_join_starts_pending() {
        let p = pending_participation();
        assert_eq!(p.status, ParticipationStatus::Pending);
        assert_eq!(p.version, 0);
        assert!(p.status.is_active());
    }

    #[test]
    fn test_approve_from_pending() {
        let p = pending_participation().approve().unwrap();
        assert_eq!(p.status, ParticipationStatus::Confirmed);
    }

    #[test]
    fn test_approve_twice_fails() {
        let p = pending_participation().approve().unwrap();
        assert!(matches!(
            p.approve().unwrap_err(),
            DomainError::InvalidParticipationTransition {
                from: ParticipationStatus::Confirmed,
                action: "approve"
            }
        ));
    }

    #[test]
    fn test_reject_from_pending() {
        let p = pending_participation().reject().unwrap();
        assert_eq!(p.status, ParticipationStatus::Rejected);
        assert!(!p.status.is_active());
    }

    #[test]
    fn test_only_confirmed_can_cancel() {
        let pending = pending_participation();
        assert!(!pending.can_cancel());
        assert!(pending.clone().cancel().is_err());

        let confirmed = pending.approve().unwrap();
        assert!(confirmed.can_cancel());
        let cancelled = confirmed.cancel().unwrap();
        assert_eq!(cancelled.status, ParticipationStatus::Cancelled);
    }

    #[test]
    fn test_double_cancel_is_state_error() {
        let cancelled = pending_participation().approve().unwrap().cancel().unwrap();
        // The loser of a cancel race sees an invalid-state error, not a
        // version conflict.
        assert!(matches!(
            cancelled.cancel().unwrap_err(),
            DomainError::InvalidParticipationTransition {
                from: ParticipationStatus::Cancelled,
                action: "cancel"
            }
        ));
    }

    #[test]
    fn test_reactivate_from_cancelled() {
        let cancelled = pending_participation().approve().unwrap().cancel().unwrap();
        let later = Utc::now();
        let p = cancelled.reactivate(later).unwrap();
        assert_eq!(p.status, ParticipationStatus::Pending);
        assert_eq!(p.joined_at, later);
    }

    #[test]
    fn test_reactivate_requires_cancelled() {
        let p = pending_participation();
        assert!(p.reactivate(Utc::now()).is_err());
    }

    #[test]
    fn test_rejected_is_terminal() {
        let p = pending_participation().reject().unwrap();
        assert!(p.clone().approve().is_err());
        assert!(p.clone().cancel().is_err());
        assert!(p.reactivate(Utc::now()).is_err());
    }

    #[test]
    fn test_participation_response_serialization() {
        let response = ParticipationResponse::from(pending_participation());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"PENDING\""));
        assert!(json.contains("\"matchId\""));
    }
}
