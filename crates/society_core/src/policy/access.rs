//! Directory view and record mutation rules.
//!
//! # Responsibility
//! - Decide whether an identity may see the whole directory.
//! - Decide whether an identity may edit or delete one record.
//! - Derive the member email set persisted next to every record.
//!
//! # Invariants
//! - Handles are compared trimmed and case-insensitively everywhere.
//! - A blank handle never matches a creator, member or admin.
//! - Edit and delete share one rule.

use crate::model::flat::FlatId;
use crate::model::member::HouseholdMember;
use crate::model::record::{DirectoryRecord, Identity};
use std::collections::BTreeSet;

/// Access tier of one identity against the current record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// May only submit data for an unclaimed flat.
    Restricted,
    /// Owns or appears in at least one record, or is an admin.
    Registered,
}

impl AccessStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restricted => "restricted",
            Self::Registered => "registered",
        }
    }
}

/// Normalized set of privileged handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminHandles {
    handles: BTreeSet<String>,
}

impl AdminHandles {
    pub fn new<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            handles: handles
                .into_iter()
                .filter_map(|handle| normalize_handle(handle.as_ref()))
                .collect(),
        }
    }

    pub fn contains(&self, handle: &str) -> bool {
        normalize_handle(handle).is_some_and(|handle| self.handles.contains(&handle))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Stateless decision functions over caller-supplied records.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admins: AdminHandles,
}

impl AccessPolicy {
    pub fn new(admins: AdminHandles) -> Self {
        Self { admins }
    }

    pub fn admins(&self) -> &AdminHandles {
        &self.admins
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admins.contains(&identity.handle)
    }

    /// True for admins, record creators and listed members of any record.
    pub fn can_view_directory(&self, identity: &Identity, records: &[DirectoryRecord]) -> bool {
        self.is_admin(identity)
            || records
                .iter()
                .any(|record| is_associated(&identity.handle, record))
    }

    /// True for admins, the record's creator and its listed members.
    pub fn can_mutate(&self, identity: &Identity, record: &DirectoryRecord) -> bool {
        self.is_admin(identity) || is_associated(&identity.handle, record)
    }

    /// Flats the identity created or is listed in, in floor-major order.
    pub fn associated_flats(&self, identity: &Identity, records: &[DirectoryRecord]) -> Vec<FlatId> {
        let flats: BTreeSet<FlatId> = records
            .iter()
            .filter(|record| is_associated(&identity.handle, record))
            .map(|record| record.flat_id)
            .collect();
        flats.into_iter().collect()
    }

    /// Current tier; reverts to `Restricted` once the last associated record
    /// is gone unless the identity is an admin.
    pub fn access_status(&self, identity: &Identity, records: &[DirectoryRecord]) -> AccessStatus {
        if self.can_view_directory(identity, records) {
            AccessStatus::Registered
        } else {
            AccessStatus::Restricted
        }
    }
}

/// Collects non-blank member emails.
///
/// Duplicates are collapsed case-insensitively; the first spelling wins.
pub fn derive_member_emails(members: &[HouseholdMember]) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut emails = BTreeSet::new();
    for email in members.iter().filter_map(HouseholdMember::normalized_email) {
        if seen.insert(email.to_lowercase()) {
            emails.insert(email.to_string());
        }
    }
    emails
}

/// Compares two handles the way every policy check does.
pub fn handles_match(left: &str, right: &str) -> bool {
    match (normalize_handle(left), normalize_handle(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn is_associated(handle: &str, record: &DirectoryRecord) -> bool {
    handles_match(handle, &record.created_by)
        || record
            .member_emails
            .iter()
            .any(|email| handles_match(handle, email))
}

fn normalize_handle(handle: &str) -> Option<String> {
    let trimmed = handle.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
