//! Domain models for Matchday.

pub mod participation;
pub mod sports_match;

pub use participation::{
    ListParticipationsResponse, Participation, ParticipationResponse, ParticipationStatus,
};
pub use sports_match::{
    CreateMatchRequest, ListMatchesResponse, Match, MatchChanges, MatchResponse, MatchSnapshot,
    MatchStatus, NearbyMatchesQuery, UpdateMatchRequest,
};
