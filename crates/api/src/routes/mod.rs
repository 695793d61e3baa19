//! API route handlers.

pub mod health;
pub mod matches;
pub mod participations;
