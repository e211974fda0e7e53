//! Directory domain model.
//!
//! # Responsibility
//! - Define flat identifiers, household rosters and directory records.
//! - Validate roster shape at the boundary, before storage or policy code.
//!
//! # Invariants
//! - Every record is keyed by exactly one canonical `FlatId`.
//! - Deletion is a hard delete; the flat becomes available again.

pub mod flat;
pub mod member;
pub mod record;
