//! Core domain logic for the society directory.
//! This crate is the single source of truth for flat allocation and
//! directory access invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DirectoryConfig};
pub use export::csv_export::{export_csv, ExportError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::flat::{FlatId, InvalidKeyError, FLAT_COUNT, FLOOR_COUNT, UNITS_PER_FLOOR};
pub use model::member::{BloodGroup, Gender, HouseholdMember, Relation};
pub use model::record::{
    DirectoryRecord, Identity, RecordDraft, RecordValidationError, ResidentClass, Vehicle,
    VehicleClass,
};
pub use policy::access::{
    derive_member_emails, handles_match, AccessPolicy, AccessStatus, AdminHandles,
};
pub use policy::flat_registry::{FlatRegistry, Occupancy};
pub use repo::record_repo::{RecordRepository, RepoError, RepoResult, SqliteRecordRepository};
pub use service::directory_service::{
    DirectoryAction, DirectoryEntry, DirectoryResult, DirectoryService, DirectoryServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
