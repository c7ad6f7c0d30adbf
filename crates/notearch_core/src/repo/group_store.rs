//! Group record store contracts and implementations.
//!
//! # Responsibility
//! - Persist one JSON blob per group under `GroupData_{id}`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Saving an existing id replaces its record.
//! - `load_all_group_records` returns blobs ordered by group id.

use crate::db::DbError;
use crate::model::group::{record_key, GroupId, GroupValidationError};
use log::debug;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Record store error.
#[derive(Debug)]
pub enum RepoError {
    Validation(GroupValidationError),
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid group record json: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted group data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<GroupValidationError> for RepoError {
    fn from(value: GroupValidationError) -> Self {
        Self::Validation(value)
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

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence host for group records.
pub trait GroupRecordStore {
    fn save_group_record(&mut self, group_id: GroupId, data: &str) -> RepoResult<()>;
    fn load_all_group_records(&self) -> RepoResult<Vec<String>>;
    /// Removing a missing record is not an error.
    fn delete_group_record(&mut self, group_id: GroupId) -> RepoResult<()>;
}

/// SQLite-backed group record store.
pub struct SqliteGroupStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupStore<'conn> {
    /// Wraps a connection returned by `db::open_db*` (migrations applied).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GroupRecordStore for SqliteGroupStore<'_> {
    fn save_group_record(&mut self, group_id: GroupId, data: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO group_records (record_key, group_id, data, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT(record_key) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at;",
            params![record_key(group_id), group_id, data],
        )?;
        Ok(())
    }

    fn load_all_group_records(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data, updated_at FROM group_records ORDER BY group_id ASC;")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut records = Vec::new();
        let mut newest_update_ms = 0_i64;
        for row in rows {
            let (data, updated_at) = row?;
            newest_update_ms = newest_update_ms.max(updated_at);
            records.push(data);
        }
        debug!(
            "event=group_records_load module=repo status=ok records={} newest_update_ms={newest_update_ms}",
            records.len()
        );
        Ok(records)
    }

    fn delete_group_record(&mut self, group_id: GroupId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM group_records WHERE record_key = ?1;",
            [record_key(group_id)],
        )?;
        Ok(())
    }
}

/// In-process record store, keyed like the persisted form.
#[derive(Debug, Default, Clone)]
pub struct MemoryGroupStore {
    records: BTreeMap<GroupId, String>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group_id: GroupId) -> Option<&str> {
        self.records.get(&group_id).map(String::as_str)
    }

    /// Record keys currently stored, e.g. `GroupData_1`.
    pub fn keys(&self) -> Vec<String> {
        self.records.keys().copied().map(record_key).collect()
    }
}

impl GroupRecordStore for MemoryGroupStore {
    fn save_group_record(&mut self, group_id: GroupId, data: &str) -> RepoResult<()> {
        self.records.insert(group_id, data.to_string());
        Ok(())
    }

    fn load_all_group_records(&self) -> RepoResult<Vec<String>> {
        Ok(self.records.values().cloned().collect())
    }

    fn delete_group_record(&mut self, group_id: GroupId) -> RepoResult<()> {
        self.records.remove(&group_id);
        Ok(())
    }
}
