//! Shared utilities and common types for the Matchday backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Common validation logic (coordinates, capacity, schedules)
//! - Cursor-based pagination helpers

pub mod pagination;
pub mod validation;
