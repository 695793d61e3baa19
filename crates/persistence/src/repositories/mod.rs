//! Repository implementations for database operations.

pub mod participation;
pub mod providers;
pub mod scheduler_lease;
pub mod sports_match;

pub use participation::ParticipationRepository;
pub use providers::{PgLocationProvider, PgUserDirectory};
pub use scheduler_lease::SchedulerLeaseRepository;
pub use sports_match::MatchRepository;
