//! Domain layer for the Matchday backend.
//!
//! This crate contains:
//! - Domain models (Match, Participation) with their lifecycle rules
//! - Pure business-rule validation for participation commands
//! - Ports consumed from external collaborators (geo index, identity,
//!   locations)
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
