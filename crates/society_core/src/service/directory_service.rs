//! Directory use-case service.
//!
//! # Responsibility
//! - Populate flat selection from current occupancy.
//! - Admit, edit and delete records under the access rules.
//! - Gate the directory-wide view and export.
//!
//! # Invariants
//! - Every decision re-reads the store first; last write wins.
//! - `created_by` is fixed by the first submission and survives edits.
//! - Stored keys outside the flat space are surfaced, never skipped.

use crate::export::csv_export::{export_csv, ExportError};
use crate::logging::mask_handle;
use crate::model::flat::{FlatId, InvalidKeyError};
use crate::model::record::{DirectoryRecord, Identity, RecordDraft, RecordValidationError};
use crate::policy::access::{AccessPolicy, AccessStatus};
use crate::policy::flat_registry::{is_flat_assignable, FlatRegistry, Occupancy};
use crate::repo::record_repo::{RecordRepository, RepoError};
use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Action names used in denial errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryAction {
    Submit,
    Edit,
    Delete,
    View,
    Export,
}

impl DirectoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::View => "view",
            Self::Export => "export",
        }
    }
}

/// Errors from directory service operations.
#[derive(Debug)]
pub enum DirectoryServiceError {
    /// Roster failed boundary validation.
    Validation(RecordValidationError),
    /// Flat is occupied by another record.
    FlatNotAssignable(FlatId),
    /// Identity is not allowed to perform the action.
    PermissionDenied {
        action: DirectoryAction,
        flat_id: Option<FlatId>,
    },
    /// Target record does not exist.
    RecordNotFound(FlatId),
    /// Store holds a key outside the flat space.
    InvalidKey(InvalidKeyError),
    Export(ExportError),
    Repo(RepoError),
}

impl Display for DirectoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::FlatNotAssignable(flat_id) => {
                write!(f, "flat {flat_id} already has a directory record")
            }
            Self::PermissionDenied {
                action,
                flat_id: Some(flat_id),
            } => write!(f, "not allowed to {} record for flat {flat_id}", action.as_str()),
            Self::PermissionDenied {
                action,
                flat_id: None,
            } => write!(f, "not allowed to {} the directory", action.as_str()),
            Self::RecordNotFound(flat_id) => write!(f, "directory record not found: {flat_id}"),
            Self::InvalidKey(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DirectoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidKey(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DirectoryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(flat_id) => Self::RecordNotFound(flat_id),
            RepoError::InvalidKey(err) => Self::InvalidKey(err),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<RecordValidationError> for DirectoryServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<InvalidKeyError> for DirectoryServiceError {
    fn from(value: InvalidKeyError) -> Self {
        Self::InvalidKey(value)
    }
}

impl From<ExportError> for DirectoryServiceError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryServiceError>;

/// One directory row plus whether the viewer may edit/delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub record: DirectoryRecord,
    pub can_mutate: bool,
}

/// Directory service facade over a record repository.
pub struct DirectoryService<R: RecordRepository> {
    repo: R,
    policy: AccessPolicy,
    registry: FlatRegistry,
}

impl<R: RecordRepository> DirectoryService<R> {
    pub fn new(repo: R, policy: AccessPolicy) -> Self {
        Self {
            repo,
            policy,
            registry: FlatRegistry::new(),
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Availability of every flat against the current store.
    pub fn occupancy(&self) -> DirectoryResult<BTreeMap<FlatId, Occupancy>> {
        let occupied = self.occupied_flats()?;
        Ok(self.registry.classify(&occupied))
    }

    /// Flats a selection control may offer; `editing` stays selectable.
    pub fn assignable_flats(&self, editing: Option<FlatId>) -> DirectoryResult<Vec<FlatId>> {
        let occupied = self.occupied_flats()?;
        Ok(self.registry.assignable_identifiers(&occupied, editing))
    }

    /// Creates or fully replaces the record for `draft.flat_id`.
    ///
    /// `editing` names the record the caller opened for editing. When it
    /// differs from the draft's flat the record is moved: written under the
    /// new flat, then removed from the old one.
    ///
    /// # Errors
    /// - `Validation` for an incomplete roster.
    /// - `FlatNotAssignable` when another record holds the flat.
    /// - `PermissionDenied` for anonymous identities or edits by strangers.
    pub fn submit_record(
        &self,
        identity: &Identity,
        draft: RecordDraft,
        editing: Option<FlatId>,
    ) -> DirectoryResult<DirectoryRecord> {
        let target = draft.flat_id;
        let action = if editing.is_some() {
            DirectoryAction::Edit
        } else {
            DirectoryAction::Submit
        };
        if identity.is_anonymous() {
            return Err(self.deny(identity, action, Some(target)));
        }
        draft.validate()?;

        let occupied = self.occupied_flats()?;
        if !is_flat_assignable(target, &occupied, editing) {
            warn!(
                "event=record_submit module=service status=rejected reason=flat_occupied flat={target}"
            );
            return Err(DirectoryServiceError::FlatNotAssignable(target));
        }

        let previous = match editing.filter(|flat| occupied.contains(flat)) {
            Some(flat) => {
                let record = self
                    .repo
                    .get_record(flat)?
                    .ok_or(DirectoryServiceError::RecordNotFound(flat))?;
                if !self.policy.can_mutate(identity, &record) {
                    return Err(self.deny(identity, DirectoryAction::Edit, Some(flat)));
                }
                Some(record)
            }
            None => None,
        };

        let created_by = previous
            .as_ref()
            .map(|record| record.created_by.clone())
            .unwrap_or_else(|| identity.handle.trim().to_string());
        let record = DirectoryRecord::from_draft(draft, created_by, now_ms())?;
        match previous.filter(|previous| previous.flat_id != target) {
            Some(previous) => {
                self.repo.move_record(previous.flat_id, &record)?;
                info!(
                    "event=record_move module=service status=ok from_flat={} to_flat={target}",
                    previous.flat_id
                );
            }
            None => self.repo.upsert_record(&record)?,
        }

        info!(
            "event=record_submit module=service status=ok action={} flat={target} members={} vehicles={} actor={}",
            action.as_str(),
            record.members.len(),
            record.vehicles.len(),
            mask_handle(&identity.handle)
        );
        Ok(record)
    }

    /// Returns one record to an identity allowed to view the directory.
    pub fn get_record(&self, identity: &Identity, flat_id: FlatId) -> DirectoryResult<DirectoryRecord> {
        let records = self.repo.list_records()?;
        if !self.policy.can_view_directory(identity, &records) {
            return Err(self.deny(identity, DirectoryAction::View, Some(flat_id)));
        }
        records
            .into_iter()
            .find(|record| record.flat_id == flat_id)
            .ok_or(DirectoryServiceError::RecordNotFound(flat_id))
    }

    /// Full directory in flat order, with per-row mutate flags.
    pub fn list_directory(&self, identity: &Identity) -> DirectoryResult<Vec<DirectoryEntry>> {
        let records = self.repo.list_records()?;
        if !self.policy.can_view_directory(identity, &records) {
            return Err(self.deny(identity, DirectoryAction::View, None));
        }
        Ok(records
            .into_iter()
            .map(|record| DirectoryEntry {
                can_mutate: self.policy.can_mutate(identity, &record),
                record,
            })
            .collect())
    }

    /// Deletes one record; the flat becomes available again.
    pub fn delete_record(&self, identity: &Identity, flat_id: FlatId) -> DirectoryResult<()> {
        let record = self
            .repo
            .get_record(flat_id)?
            .ok_or(DirectoryServiceError::RecordNotFound(flat_id))?;
        if !self.policy.can_mutate(identity, &record) {
            return Err(self.deny(identity, DirectoryAction::Delete, Some(flat_id)));
        }
        self.repo.delete_record(flat_id)?;
        info!(
            "event=record_delete module=service status=ok flat={flat_id} actor={}",
            mask_handle(&identity.handle)
        );
        Ok(())
    }

    /// Access tier of `identity` against the current store.
    pub fn access_status(&self, identity: &Identity) -> DirectoryResult<AccessStatus> {
        let records = self.repo.list_records()?;
        Ok(self.policy.access_status(identity, &records))
    }

    /// Flats whose records `identity` created or is listed in.
    pub fn associated_flats(&self, identity: &Identity) -> DirectoryResult<Vec<FlatId>> {
        let records = self.repo.list_records()?;
        Ok(self.policy.associated_flats(identity, &records))
    }

    /// Renders the directory as CSV for an identity allowed to view it.
    pub fn export_csv(&self, identity: &Identity, today: NaiveDate) -> DirectoryResult<String> {
        let records = self.repo.list_records()?;
        if !self.policy.can_view_directory(identity, &records) {
            return Err(self.deny(identity, DirectoryAction::Export, None));
        }
        let csv = export_csv(&records, today)?;
        info!(
            "event=directory_export module=service status=ok rows={}",
            records.len()
        );
        Ok(csv)
    }

    fn occupied_flats(&self) -> DirectoryResult<BTreeSet<FlatId>> {
        let keys = self.repo.list_flat_keys()?;
        self.registry.parse_keys(&keys).map_err(|err| {
            error!(
                "event=flat_key_check module=service status=error error_code=invalid_flat_key key={}",
                err.key
            );
            DirectoryServiceError::InvalidKey(err)
        })
    }

    fn deny(
        &self,
        identity: &Identity,
        action: DirectoryAction,
        flat_id: Option<FlatId>,
    ) -> DirectoryServiceError {
        warn!(
            "event=access_check module=service status=denied action={} flat={} actor={}",
            action.as_str(),
            flat_id.map_or_else(|| "-".to_string(), FlatId::as_key),
            mask_handle(&identity.handle)
        );
        DirectoryServiceError::PermissionDenied { action, flat_id }
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
