//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod participation;
pub mod sports_match;

pub use participation::{ParticipationEntity, ParticipationStatusDb};
pub use sports_match::{MatchEntity, MatchStatusDb};
