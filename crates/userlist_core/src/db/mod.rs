//! SQLite bootstrap for the local document store.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing `SqliteDocumentStore`.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No document is read or written before migrations succeed.
//! - Bootstrap errors name the step that failed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening, migrating or querying the document database.
#[derive(Debug)]
pub enum DbError {
    /// The database file (or `:memory:`) could not be opened.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// A connection setting could not be applied.
    Configure(rusqlite::Error),
    /// Migration to `version` failed and was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open document database `{target}`: {source}")
            }
            Self::Configure(err) => write!(f, "cannot configure document database: {err}"),
            Self::Migration { version, source } => {
                write!(f, "document schema migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "document schema version {found} is newer than supported {supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Configure(err) | Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
