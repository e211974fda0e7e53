//! Directory record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store one record per flat with full-replace upsert semantics.
//! - Keep SQL and JSON column details inside the persistence boundary.
//!
//! # Invariants
//! - Writes call `DirectoryRecord::validate()` before SQL mutations.
//! - Reads reject corrupt rows (bad flat keys, bad JSON, empty rosters)
//!   instead of masking them.
//! - `created_at` survives upserts; every other column is replaced.
//! - A move writes the new flat and clears the old one in one transaction.

use crate::db::DbError;
use crate::model::flat::{FlatId, InvalidKeyError};
use crate::model::record::{DirectoryRecord, RecordValidationError, ResidentClass};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT
    flat_id,
    resident_class,
    native_place,
    members_json,
    vehicles_json,
    member_emails_json,
    created_by,
    updated_at
FROM directory_records";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound(FlatId),
    /// A stored key is outside the canonical flat space.
    InvalidKey(InvalidKeyError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(flat_id) => write!(f, "directory record not found: {flat_id}"),
            Self::InvalidKey(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidKey(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<InvalidKeyError> for RepoError {
    fn from(value: InvalidKeyError) -> Self {
        Self::InvalidKey(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage collaborator for directory records.
pub trait RecordRepository {
    /// Inserts or fully replaces the record stored under `record.flat_id`.
    fn upsert_record(&self, record: &DirectoryRecord) -> RepoResult<()>;
    fn get_record(&self, flat_id: FlatId) -> RepoResult<Option<DirectoryRecord>>;
    /// All records in floor-major flat order.
    fn list_records(&self) -> RepoResult<Vec<DirectoryRecord>>;
    /// Raw stored keys, unvalidated, for occupancy checks.
    fn list_flat_keys(&self) -> RepoResult<Vec<String>>;
    fn delete_record(&self, flat_id: FlatId) -> RepoResult<()>;
    /// Stores `record` under its own flat and removes `from`, atomically.
    ///
    /// Fails with `NotFound` when `from` holds no record; nothing is written
    /// in that case.
    fn move_record(&self, from: FlatId, record: &DirectoryRecord) -> RepoResult<()>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn upsert_record(&self, record: &DirectoryRecord) -> RepoResult<()> {
        upsert_in(self.conn, record)
    }

    fn get_record(&self, flat_id: FlatId) -> RepoResult<Option<DirectoryRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE flat_id = ?1;"))?;
        let mut rows = stmt.query([flat_id.as_key()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn list_records(&self) -> RepoResult<Vec<DirectoryRecord>> {
        let mut stmt = self.conn.prepare(&format!("{RECORD_SELECT_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        // Text order puts "1001" before "101"; sort on the typed key.
        records.sort_by_key(|record| record.flat_id);
        Ok(records)
    }

    fn list_flat_keys(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT flat_id FROM directory_records ORDER BY flat_id ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn delete_record(&self, flat_id: FlatId) -> RepoResult<()> {
        delete_in(self.conn, flat_id)
    }

    fn move_record(&self, from: FlatId, record: &DirectoryRecord) -> RepoResult<()> {
        if from == record.flat_id {
            return self.upsert_record(record);
        }

        // Dropping `tx` on an early return rolls both statements back.
        let tx = self.conn.unchecked_transaction()?;
        upsert_in(&tx, record)?;
        delete_in(&tx, from)?;
        tx.commit()?;
        Ok(())
    }
}

fn upsert_in(conn: &Connection, record: &DirectoryRecord) -> RepoResult<()> {
    record.validate()?;

    conn.execute(
        "INSERT INTO directory_records (
            flat_id,
            resident_class,
            native_place,
            members_json,
            vehicles_json,
            member_emails_json,
            created_by,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(flat_id) DO UPDATE SET
            resident_class = excluded.resident_class,
            native_place = excluded.native_place,
            members_json = excluded.members_json,
            vehicles_json = excluded.vehicles_json,
            member_emails_json = excluded.member_emails_json,
            created_by = excluded.created_by,
            updated_at = excluded.updated_at;",
        params![
            record.flat_id.as_key(),
            record.resident_class.as_str(),
            record.native_place.as_deref(),
            to_json(&record.members, "members")?,
            to_json(&record.vehicles, "vehicles")?,
            to_json(&record.member_emails, "member_emails")?,
            record.created_by.as_str(),
            record.updated_at_ms,
        ],
    )?;

    Ok(())
}

fn delete_in(conn: &Connection, flat_id: FlatId) -> RepoResult<()> {
    let changed = conn.execute(
        "DELETE FROM directory_records WHERE flat_id = ?1;",
        [flat_id.as_key()],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound(flat_id));
    }
    Ok(())
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<DirectoryRecord> {
    let flat_text: String = row.get("flat_id")?;
    let flat_id = FlatId::parse(&flat_text)?;

    let class_text: String = row.get("resident_class")?;
    let resident_class = ResidentClass::parse(&class_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid resident class `{class_text}` for flat {flat_id}"
        ))
    })?;

    let record = DirectoryRecord {
        flat_id,
        resident_class,
        native_place: row.get("native_place")?,
        members: from_json(&row.get::<_, String>("members_json")?, "members", flat_id)?,
        vehicles: from_json(&row.get::<_, String>("vehicles_json")?, "vehicles", flat_id)?,
        member_emails: from_json(
            &row.get::<_, String>("member_emails_json")?,
            "member_emails",
            flat_id,
        )?,
        created_by: row.get("created_by")?,
        updated_at_ms: row.get("updated_at")?,
    };
    record.validate()?;
    Ok(record)
}

fn to_json<T: serde::Serialize>(value: &T, column: &str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode {column}: {err}")))
}

fn from_json<T: serde::de::DeserializeOwned>(
    raw: &str,
    column: &str,
    flat_id: FlatId,
) -> RepoResult<T> {
    serde_json::from_str(raw).map_err(|err| {
        RepoError::InvalidData(format!("invalid {column} json for flat {flat_id}: {err}"))
    })
}
