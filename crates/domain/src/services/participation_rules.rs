//! Pure business-rule checks for participation commands.
//!
//! All checks run against a `MatchSnapshot` and the caller's participation
//! history, so they never touch persistence. The orchestration layer loads
//! fresh state inside its transaction and fails fast on the first violated
//! rule.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{MatchSnapshot, Participation};

/// How long before the start of a match a confirmed participation may still
/// be cancelled.
pub const CANCELLATION_DEADLINE_HOURS: i64 = 2;

/// An active (PENDING or CONFIRMED) commitment of a user in some match,
/// reduced to its time window for the overlap check.
#[derive(Debug, Clone)]
pub struct ActiveCommitment {
    pub match_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Half-open interval overlap: `[a_start, a_end)` intersects
/// `[b_start, b_end)`. Adjacent windows do not overlap.
fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Validates a join request.
///
/// `existing` is the user's prior participation for this match, if any.
/// A cancelled one is allowed through (it will be reactivated); an active
/// one is a duplicate join.
pub fn validate_join(
    snapshot: &MatchSnapshot,
    user_id: Uuid,
    existing: Option<&Participation>,
    commitments: &[ActiveCommitment],
) -> Result<(), DomainError> {
    if snapshot.host_id == user_id {
        return Err(DomainError::HostCannotJoin);
    }

    if !snapshot.status.is_joinable() {
        return Err(DomainError::MatchNotJoinable(snapshot.status));
    }

    if !snapshot.has_open_slot() {
        return Err(DomainError::MatchFull {
            max_participants: snapshot.max_participants,
        });
    }

    if let Some(participation) = existing {
        if participation.status.is_active() {
            return Err(DomainError::AlreadyJoined);
        }
    }

    let starts_at = snapshot.starts_at();
    let ends_at = snapshot.ends_at();
    for commitment in commitments {
        if commitment.match_id == snapshot.id {
            continue;
        }
        if windows_overlap(starts_at, ends_at, commitment.starts_at, commitment.ends_at) {
            return Err(DomainError::OverlappingMatch {
                other_match_id: commitment.match_id,
            });
        }
    }

    Ok(())
}

/// Validates an owner cancellation of a confirmed participation.
pub fn validate_cancel(
    snapshot: &MatchSnapshot,
    participation: &Participation,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if participation.user_id != user_id {
        return Err(DomainError::NotParticipationOwner {
            participation_id: participation.id,
            user_id,
        });
    }

    if !participation.can_cancel() {
        return Err(DomainError::InvalidParticipationTransition {
            from: participation.status,
            action: "cancel",
        });
    }

    let starts_at = snapshot.starts_at();
    if now >= starts_at {
        return Err(DomainError::MatchAlreadyStarted);
    }

    if now >= starts_at - Duration::hours(CANCELLATION_DEADLINE_HOURS) {
        return Err(DomainError::CancellationDeadlinePassed);
    }

    Ok(())
}

/// Validates host approval of a pending participation.
///
/// Capacity is re-validated here: the match may have filled up between the
/// join request and the approval.
pub fn validate_approve(
    snapshot: &MatchSnapshot,
    participation: &Participation,
    caller_id: Uuid,
) -> Result<(), DomainError> {
    if snapshot.host_id != caller_id {
        return Err(DomainError::NotMatchHost {
            match_id: snapshot.id,
            user_id: caller_id,
        });
    }

    if participation.status != crate::models::ParticipationStatus::Pending {
        return Err(DomainError::InvalidParticipationTransition {
            from: participation.status,
            action: "approve",
        });
    }

    if !snapshot.has_open_slot() {
        return Err(DomainError::MatchFull {
            max_participants: snapshot.max_participants,
        });
    }

    Ok(())
}

/// Validates host rejection of a pending participation.
pub fn validate_reject(
    snapshot: &MatchSnapshot,
    participation: &Participation,
    caller_id: Uuid,
) -> Result<(), DomainError> {
    if snapshot.host_id != caller_id {
        return Err(DomainError::NotMatchHost {
            match_id: snapshot.id,
            user_id: caller_id,
        });
    }

    if participation.status != crate::models::ParticipationStatus::Pending {
        return Err(DomainError::InvalidParticipationTransition {
            from: participation.status,
            action: "reject",
        });
    }

    Ok(())
}
