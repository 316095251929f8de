//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist collection documents as JSON bodies in `documents`.
//! - Fan out full collection snapshots to in-process subscribers.
//!
//! # Invariants
//! - Snapshots are published in commit order: a write reads its collection
//!   and notifies listeners before releasing the connection.
//! - Snapshot order is insertion order (`seq ASC`).
//! - Rows whose body is not a JSON object are left out of snapshots.
//! - Document ids are UUID v4 in simple form and are never reused.

use super::{
    validate_collection, Document, DocumentId, DocumentStore, Fields, Snapshot, SnapshotEvent,
    SnapshotListener, StoreError, StoreResult, Subscription,
};
use crate::db::{open_db, open_db_in_memory};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;
use uuid::Uuid;

struct ListenerEntry {
    collection: String,
    listener: SnapshotListener,
}

struct StoreInner {
    conn: Mutex<Connection>,
    listeners: Mutex<BTreeMap<u64, ListenerEntry>>,
    next_listener_id: AtomicU64,
}

/// Local document store with live snapshot subscriptions.
///
/// Cloning is cheap; clones share the same connection and subscribers.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    inner: Arc<StoreInner>,
}

impl SqliteDocumentStore {
    /// Opens a file-backed store, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens an empty in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                conn: Mutex::new(conn),
                listeners: Mutex::new(BTreeMap::new()),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    /// Number of live subscriptions across all collections.
    pub fn subscription_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Reads the current snapshot of one collection without subscribing.
    pub fn snapshot(&self, collection: &str) -> StoreResult<Snapshot> {
        validate_collection(collection)?;
        let conn = lock(&self.inner.conn);
        read_snapshot(&conn, collection)
    }

    fn publish(&self, conn: &Connection, collection: &str) {
        let targets = self.listeners_for(collection);
        if targets.is_empty() {
            return;
        }

        let event = read_snapshot(conn, collection);
        match &event {
            Ok(snapshot) => debug!(
                "event=snapshot_publish module=store status=ok collection={} documents={} listeners={}",
                collection,
                snapshot.len(),
                targets.len()
            ),
            Err(err) => error!(
                "event=snapshot_publish module=store status=error collection={} error={}",
                collection, err
            ),
        }
        for listener in targets {
            listener(clone_event(&event));
        }
    }

    fn listeners_for(&self, collection: &str) -> Vec<SnapshotListener> {
        lock(&self.inner.listeners)
            .values()
            .filter(|entry| entry.collection == collection)
            .map(|entry| Arc::clone(&entry.listener))
            .collect()
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn subscribe(
        &self,
        collection: &str,
        listener: SnapshotListener,
    ) -> StoreResult<Subscription> {
        validate_collection(collection)?;

        let listener_id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        // Holding the connection keeps the initial snapshot ordered before any
        // write committed after registration.
        let conn = lock(&self.inner.conn);
        lock(&self.inner.listeners).insert(
            listener_id,
            ListenerEntry {
                collection: collection.to_string(),
                listener: Arc::clone(&listener),
            },
        );
        info!(
            "event=store_subscribe module=store status=ok collection={} listener_id={}",
            collection, listener_id
        );
        listener(read_snapshot(&conn, collection));
        drop(conn);

        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                // Publishing runs under the connection lock; waiting for it here
                // means no in-flight publish still holds this listener.
                let _conn = lock(&inner.conn);
                lock(&inner.listeners).remove(&listener_id);
                info!(
                    "event=store_unsubscribe module=store status=ok listener_id={}",
                    listener_id
                );
            }
        }))
    }

    fn insert(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId> {
        validate_collection(collection)?;
        let started_at = Instant::now();
        let id = DocumentId::new(Uuid::new_v4().simple().to_string());
        let body = encode_fields(&fields)?;

        let conn = lock(&self.inner.conn);
        conn.execute(
            "INSERT INTO documents (collection, id, fields) VALUES (?1, ?2, ?3);",
            params![collection, id.as_str(), body],
        )?;
        info!(
            "event=doc_insert module=store status=ok collection={} duration_ms={}",
            collection,
            started_at.elapsed().as_millis()
        );
        self.publish(&conn, collection);
        Ok(id)
    }

    fn update(&self, collection: &str, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        validate_collection(collection)?;
        let started_at = Instant::now();

        let conn = lock(&self.inner.conn);
        let existing: Option<String> = conn
            .query_row(
                "SELECT fields FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection, id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(existing) = existing else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            });
        };

        let mut merged = decode_fields(&existing)?;
        merged.extend(fields);
        conn.execute(
            "UPDATE documents
             SET
                fields = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection = ?1 AND id = ?2;",
            params![collection, id.as_str(), encode_fields(&merged)?],
        )?;
        info!(
            "event=doc_update module=store status=ok collection={} duration_ms={}",
            collection,
            started_at.elapsed().as_millis()
        );
        self.publish(&conn, collection);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        validate_collection(collection)?;
        let started_at = Instant::now();

        let conn = lock(&self.inner.conn);
        let changed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection, id.as_str()],
        )?;
        info!(
            "event=doc_delete module=store status=ok collection={} changed={} duration_ms={}",
            collection,
            changed,
            started_at.elapsed().as_millis()
        );
        if changed > 0 {
            self.publish(&conn, collection);
        }
        Ok(())
    }
}

fn read_snapshot(conn: &Connection, collection: &str) -> SnapshotEvent {
    let mut stmt = conn.prepare(
        "SELECT id, fields
         FROM documents
         WHERE collection = ?1
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([collection])?;
    let mut documents = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get("id")?;
        let body: String = row.get("fields")?;
        match decode_fields(&body) {
            Ok(fields) => documents.push(Document {
                id: DocumentId::new(id),
                fields,
            }),
            Err(err) => warn!(
                "event=snapshot_decode module=store status=skipped collection={} doc_id={} error={}",
                collection, id, err
            ),
        }
    }

    Ok(Snapshot {
        collection: collection.to_string(),
        documents,
    })
}

fn encode_fields(fields: &Fields) -> StoreResult<String> {
    serde_json::to_string(fields).map_err(|err| StoreError::InvalidData(err.to_string()))
}

fn decode_fields(body: &str) -> StoreResult<Fields> {
    serde_json::from_str(body).map_err(|err| StoreError::InvalidData(err.to_string()))
}

// Each listener gets its own event; store errors are not `Clone`.
fn clone_event(event: &SnapshotEvent) -> SnapshotEvent {
    match event {
        Ok(snapshot) => Ok(snapshot.clone()),
        Err(StoreError::InvalidData(message)) => Err(StoreError::InvalidData(message.clone())),
        Err(other) => Err(StoreError::Unavailable(other.to_string())),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
