//! Document store contract consumed by the list screen.
//!
//! # Responsibility
//! - Define the remote store client seam (`DocumentStore`).
//! - Define snapshot, document and subscription types shared by every
//!   store implementation.
//!
//! # Invariants
//! - Every snapshot carries the full collection contents, never a diff.
//! - Dropping a `Subscription` unsubscribes; no event is delivered to the
//!   listener after `drop` returns.
//! - Document ids are assigned by the store and are opaque to callers.

pub mod sqlite;

use crate::db::DbError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub use sqlite::SqliteDocumentStore;

/// Document body: top-level field name to JSON value.
pub type Fields = serde_json::Map<String, serde_json::Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Snapshot or subscription failure delivered to listeners.
pub type SnapshotEvent = Result<Snapshot, StoreError>;

/// Callback invoked on every snapshot of a subscribed collection.
///
/// Listeners must not call back into the same store synchronously.
pub type SnapshotListener = Arc<dyn Fn(SnapshotEvent) + Send + Sync>;

/// Store-assigned document identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

/// Full contents of one collection at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub collection: String,
    /// Documents in store order.
    pub documents: Vec<Document>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Store-level error for subscriptions and writes.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound {
        collection: String,
        id: DocumentId,
    },
    InvalidCollection(String),
    /// Persisted document body cannot be decoded.
    InvalidData(String),
    /// Backend is unreachable or refused the request.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => {
                write!(f, "no document to update: {collection}/{id}")
            }
            Self::InvalidCollection(name) => write!(f, "invalid collection name `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
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

/// Remote store client contract.
pub trait DocumentStore: Send + Sync {
    /// Registers `listener` for `collection`.
    ///
    /// The current snapshot is delivered before this returns, and again after
    /// every committed change.
    fn subscribe(&self, collection: &str, listener: SnapshotListener)
        -> StoreResult<Subscription>;

    /// Inserts a new document and returns its store-assigned id.
    fn insert(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId>;

    /// Merges top-level `fields` into an existing document.
    ///
    /// Returns `StoreError::NotFound` when the document does not exist.
    fn update(&self, collection: &str, id: &DocumentId, fields: Fields) -> StoreResult<()>;

    /// Deletes a document. Deleting a missing document succeeds.
    fn delete(&self, collection: &str, id: &DocumentId) -> StoreResult<()>;
}

/// Scoped subscription handle. Unsubscribes on drop.
///
/// Dropping waits for any delivery already in progress, so it must not
/// happen inside the subscription's own listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wraps the store-specific unsubscribe action.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribes now. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Rejects collection names the store cannot address.
pub fn validate_collection(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() || name.contains('/') {
        return Err(StoreError::InvalidCollection(name.to_string()));
    }
    Ok(())
}
