//! SQLite storage for confirmed enable/disable decisions.
//!
//! # Responsibility
//! - Open the enablement store and bring its schema up to date.
//! - Report store failures with the store named, so host logs can tell them
//!   apart from registry or staging errors.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No decision is read or written before migrations succeed.
//! - A store written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Name the store goes by in error text.
pub const STORE_NAME: &str = "enablement store";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected an operation on the store.
    Sqlite(rusqlite::Error),
    /// The file carries a schema this build does not know how to read.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{STORE_NAME}: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "{STORE_NAME} schema version {db_version} is newer than supported \
                 {latest_supported}; refusing to open it"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
