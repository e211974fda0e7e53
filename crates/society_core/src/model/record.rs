//! Directory record model.
//!
//! # Responsibility
//! - Define the per-flat household submission and its vehicles.
//! - Validate roster shape before anything is persisted.
//!
//! # Invariants
//! - A flat owns at most one record; `flat_id` is the storage key.
//! - A record has at least one member, and every member carries a
//!   non-blank name, a gender and a relation.
//! - `member_emails` is always derived from `members`, never supplied.
//! - Writes replace the whole record; there are no partial patches.

use crate::model::flat::FlatId;
use crate::model::member::HouseholdMember;
use crate::policy::access::derive_member_emails;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Occupancy classification of the household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidentClass {
    Owner,
    Tenant,
}

impl ResidentClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Tenant => "Tenant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Owner" => Some(Self::Owner),
            "Tenant" => Some(Self::Tenant),
            _ => None,
        }
    }
}

/// Vehicle class registered against a flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleClass {
    TwoWheeler,
    FourWheeler,
}

impl VehicleClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoWheeler => "Two Wheeler",
            Self::FourWheeler => "Four Wheeler",
        }
    }
}

/// One parked vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub class: VehicleClass,
    pub registration: String,
}

impl Vehicle {
    pub fn new(class: VehicleClass, registration: impl Into<String>) -> Self {
        Self {
            class,
            registration: registration.into(),
        }
    }
}

/// Authenticated principal supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable unique handle (email address).
    pub handle: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Anonymous sessions carry no usable handle.
    pub fn is_anonymous(&self) -> bool {
        self.handle.trim().is_empty()
    }
}

/// Roster validation failures. Block persistence; never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    NoMembers,
    BlankFullName { index: usize },
    MissingGender { index: usize },
    MissingRelation { index: usize },
    BlankVehicleRegistration { index: usize },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMembers => write!(f, "record must list at least one member"),
            Self::BlankFullName { index } => {
                write!(f, "member #{} must have a full name", index + 1)
            }
            Self::MissingGender { index } => {
                write!(f, "member #{} must have a gender", index + 1)
            }
            Self::MissingRelation { index } => {
                write!(f, "member #{} must have a relation", index + 1)
            }
            Self::BlankVehicleRegistration { index } => {
                write!(f, "vehicle #{} must have a registration number", index + 1)
            }
        }
    }
}

impl Error for RecordValidationError {}

/// Caller-supplied submission for one flat, shaped like the roster form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    #[serde(rename = "flatNo")]
    pub flat_id: FlatId,
    #[serde(rename = "residentType")]
    pub resident_class: ResidentClass,
    #[serde(default)]
    pub native_place: Option<String>,
    pub members: Vec<HouseholdMember>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}

impl RecordDraft {
    pub fn new(flat_id: FlatId, resident_class: ResidentClass) -> Self {
        Self {
            flat_id,
            resident_class,
            native_place: None,
            members: Vec::new(),
            vehicles: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: HouseholdMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        validate_roster(&self.members, &self.vehicles)
    }
}

/// Persisted household record, keyed by flat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRecord {
    pub flat_id: FlatId,
    pub resident_class: ResidentClass,
    pub native_place: Option<String>,
    pub members: Vec<HouseholdMember>,
    pub vehicles: Vec<Vehicle>,
    pub member_emails: BTreeSet<String>,
    /// Handle of the identity that performed the first submission.
    pub created_by: String,
    /// Unix epoch milliseconds of the last write.
    pub updated_at_ms: i64,
}

impl DirectoryRecord {
    /// Builds a record from a validated draft and derives `member_emails`.
    pub fn from_draft(
        draft: RecordDraft,
        created_by: impl Into<String>,
        updated_at_ms: i64,
    ) -> Result<Self, RecordValidationError> {
        draft.validate()?;
        let member_emails = derive_member_emails(&draft.members);
        Ok(Self {
            flat_id: draft.flat_id,
            resident_class: draft.resident_class,
            native_place: draft
                .native_place
                .map(|place| place.trim().to_string())
                .filter(|place| !place.is_empty()),
            members: draft.members,
            vehicles: draft.vehicles,
            member_emails,
            created_by: created_by.into(),
            updated_at_ms,
        })
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        validate_roster(&self.members, &self.vehicles)
    }
}

fn validate_roster(
    members: &[HouseholdMember],
    vehicles: &[Vehicle],
) -> Result<(), RecordValidationError> {
    if members.is_empty() {
        return Err(RecordValidationError::NoMembers);
    }

    for (index, member) in members.iter().enumerate() {
        if member.full_name.trim().is_empty() {
            return Err(RecordValidationError::BlankFullName { index });
        }
        if member.gender.is_none() {
            return Err(RecordValidationError::MissingGender { index });
        }
        if member.relation.is_none() {
            return Err(RecordValidationError::MissingRelation { index });
        }
    }

    for (index, vehicle) in vehicles.iter().enumerate() {
        if vehicle.registration.trim().is_empty() {
            return Err(RecordValidationError::BlankVehicleRegistration { index });
        }
    }

    Ok(())
}
