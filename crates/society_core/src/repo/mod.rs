//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage collaborator contract for directory records.
//! - Isolate SQLite and JSON column details from the service layer.
//!
//! # Invariants
//! - Repository writes enforce `DirectoryRecord::validate()`.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidKey`) in
//!   addition to DB transport errors.

pub mod record_repo;
