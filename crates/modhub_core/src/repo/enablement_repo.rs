//! SQLite-backed enablement store.
//!
//! # Responsibility
//! - Upsert one enablement decision per mod id.
//! - Keep an append-only history of every write.
//! - Serve as the commit pipeline's [`EnablementWriter`].
//!
//! # Invariants
//! - `mod_enablement` holds at most one row per mod id.
//! - The current row and its history row are written in one transaction.

use crate::db::DbError;
use crate::model::mod_record::{ModId, ModRecord};
use crate::staging::commit::EnablementWriter;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid enablement data: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One historical write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnablementHistoryEntry {
    pub mod_id: ModId,
    pub enabled: bool,
    pub written_at_ms: i64,
}

/// Durable enablement decisions keyed by mod id.
pub struct SqliteEnablementStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnablementStore<'conn> {
    /// Wraps a connection opened through [`crate::db::open_db`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Records `enabled` as the durable decision for `mod_id`.
    ///
    /// # Errors
    /// - `InvalidData` when `mod_id` is blank or carries surrounding
    ///   whitespace; ids are stored exactly as records carry them.
    pub fn set_enabled(&self, mod_id: &str, enabled: bool) -> StoreResult<()> {
        ensure_canonical_id(mod_id)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO mod_enablement (mod_id, enabled) VALUES (?1, ?2)
             ON CONFLICT(mod_id) DO UPDATE SET
                enabled = excluded.enabled,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![mod_id, bool_to_int(enabled)],
        )?;
        tx.execute(
            "INSERT INTO mod_enablement_history (mod_id, enabled) VALUES (?1, ?2);",
            params![mod_id, bool_to_int(enabled)],
        )?;
        tx.commit()?;

        debug!(
            "event=enablement_write module=repo status=ok mod_id={} enabled={}",
            mod_id, enabled
        );
        Ok(())
    }

    /// Returns the durable decision for `mod_id`, if one was ever written.
    pub fn get_enabled(&self, mod_id: &str) -> StoreResult<Option<bool>> {
        let value = self
            .conn
            .query_row(
                "SELECT enabled FROM mod_enablement WHERE mod_id = ?1;",
                [mod_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        value.map(int_to_bool).transpose()
    }

    /// Returns every durable decision ordered by mod id.
    pub fn load_all(&self) -> StoreResult<BTreeMap<ModId, bool>> {
        let mut stmt = self
            .conn
            .prepare("SELECT mod_id, enabled FROM mod_enablement ORDER BY mod_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut decisions = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let mod_id: String = row.get(0)?;
            let enabled = int_to_bool(row.get(1)?)?;
            decisions.insert(mod_id, enabled);
        }
        Ok(decisions)
    }

    /// Returns the write history for `mod_id`, oldest first.
    pub fn history(&self, mod_id: &str) -> StoreResult<Vec<EnablementHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT mod_id, enabled, written_at
             FROM mod_enablement_history
             WHERE mod_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([mod_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(EnablementHistoryEntry {
                mod_id: row.get(0)?,
                enabled: int_to_bool(row.get(1)?)?,
                written_at_ms: row.get(2)?,
            });
        }
        Ok(entries)
    }

    /// Overlays durable decisions onto freshly discovered records.
    ///
    /// Used by loaders that apply the operator's last confirmed choice before
    /// handing records to [`crate::ModRegistry::load`].
    pub fn apply_to(&self, records: Vec<ModRecord>) -> StoreResult<Vec<ModRecord>> {
        let decisions = self.load_all()?;
        Ok(records
            .into_iter()
            .map(|mut record| {
                if let Some(enabled) = decisions.get(record.id.as_str()) {
                    record.enabled = *enabled;
                }
                record
            })
            .collect())
    }
}

impl EnablementWriter for SqliteEnablementStore<'_> {
    type Error = StoreError;

    fn write_enablement(&self, mod_id: &str, enabled: bool) -> StoreResult<()> {
        self.set_enabled(mod_id, enabled)
    }
}

fn ensure_canonical_id(mod_id: &str) -> StoreResult<()> {
    if mod_id.trim().is_empty() {
        return Err(StoreError::InvalidData("mod id is empty".to_string()));
    }
    if mod_id.trim() != mod_id {
        return Err(StoreError::InvalidData(format!(
            "mod id has surrounding whitespace: `{mod_id}`"
        )));
    }
    Ok(())
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn int_to_bool(value: i64) -> StoreResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StoreError::InvalidData(format!(
            "enabled flag must be 0 or 1, got {other}"
        ))),
    }
}
