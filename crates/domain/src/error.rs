//! Domain error taxonomy.
//!
//! Every variant is a rule or state violation. None of these are retried by
//! the orchestration layer; only the persistence-level version conflict is.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{MatchStatus, ParticipationStatus};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Match {0} not found")]
    MatchNotFound(Uuid),

    #[error("Participation {0} not found")]
    ParticipationNotFound(Uuid),

    #[error("User {user_id} has no participation in match {match_id}")]
    ParticipationMissing { match_id: Uuid, user_id: Uuid },

    #[error("User {user_id} is not the host of match {match_id}")]
    NotMatchHost { match_id: Uuid, user_id: Uuid },

    #[error("User {user_id} does not own participation {participation_id}")]
    NotParticipationOwner {
        participation_id: Uuid,
        user_id: Uuid,
    },

    #[error("The host cannot join their own match")]
    HostCannotJoin,

    #[error("Match is not open for participation (status: {0})")]
    MatchNotJoinable(MatchStatus),

    #[error("Match is already full ({max_participants} participants)")]
    MatchFull { max_participants: i32 },

    #[error("Capacity {requested} is below the current participant count {current}")]
    CapacityBelowCount { requested: i32, current: i32 },

    #[error("User already has an active participation in this match")]
    AlreadyJoined,

    #[error("User has an overlapping commitment in match {other_match_id}")]
    OverlappingMatch { other_match_id: Uuid },

    #[error("Match can no longer be modified (status: {0})")]
    MatchNotUpdatable(MatchStatus),

    #[error("Match has already started")]
    MatchAlreadyStarted,

    #[error("Cancellation deadline has passed (2 hours before start)")]
    CancellationDeadlinePassed,

    #[error("Cannot {action} a match in status {from}")]
    InvalidMatchTransition {
        from: MatchStatus,
        action: &'static str,
    },

    #[error("Cannot {action} a participation in status {from}")]
    InvalidParticipationTransition {
        from: ParticipationStatus,
        action: &'static str,
    },

    #[error("Reactivation window has expired (1 hour after cancellation)")]
    ReactivationWindowExpired,

    #[error("Match date has already passed")]
    MatchDatePassed,

    #[error("End time must be after start time")]
    EndBeforeStart,

    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Location {0} not found")]
    LocationNotFound(Uuid),
}
