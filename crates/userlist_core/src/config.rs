//! One-time store initialization settings.
//!
//! # Responsibility
//! - Resolve where the document store lives.
//! - Open the configured store with migrations applied.
//!
//! # Invariants
//! - A blank `USERLIST_DB_PATH` falls back to the default file location.

use crate::store::{SqliteDocumentStore, StoreResult};
use log::info;
use std::path::PathBuf;

/// Environment variable overriding the store file path.
pub const DB_PATH_ENV: &str = "USERLIST_DB_PATH";
/// File name used when no path is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "userlist.sqlite3";

/// Store location settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file. `None` opens an in-memory store.
    pub db_path: Option<PathBuf>,
}

impl StoreConfig {
    /// In-memory store, used by tests and smoke runs.
    pub fn in_memory() -> Self {
        Self { db_path: None }
    }

    /// File-backed store at `path`.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
        }
    }

    /// Reads `USERLIST_DB_PATH`, defaulting to a file in the temp directory.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(DB_PATH_ENV).ok())
    }

    fn from_env_value(raw: Option<String>) -> Self {
        let path = raw
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        Self::at_path(path)
    }
}

/// Opens the store described by `config`.
pub fn open_store(config: &StoreConfig) -> StoreResult<SqliteDocumentStore> {
    match &config.db_path {
        Some(path) => {
            info!("event=store_init module=config status=start mode=file");
            SqliteDocumentStore::open(path)
        }
        None => {
            info!("event=store_init module=config status=start mode=memory");
            SqliteDocumentStore::open_in_memory()
        }
    }
}
