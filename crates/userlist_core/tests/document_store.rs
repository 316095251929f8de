use serde_json::json;
use std::sync::{Arc, Mutex};
use userlist_core::{
    DocumentId, DocumentStore, Fields, Snapshot, SnapshotEvent, SnapshotListener,
    SqliteDocumentStore, StoreError,
};

fn fields(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn recording_listener() -> (SnapshotListener, Arc<Mutex<Vec<SnapshotEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let listener: SnapshotListener = Arc::new(move |event| {
        sink.lock().unwrap().push(event);
    });
    (listener, events)
}

fn snapshots(events: &Arc<Mutex<Vec<SnapshotEvent>>>) -> Vec<Snapshot> {
    events
        .lock()
        .unwrap()
        .iter()
        .map(|event| event.as_ref().expect("snapshot event").clone())
        .collect()
}

#[test]
fn subscribe_delivers_current_snapshot_immediately() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    store
        .insert("users", fields(json!({"name": "Ann", "email": "ann@x.com", "age": 30})))
        .unwrap();

    let (listener, events) = recording_listener();
    let _subscription = store.subscribe("users", listener).unwrap();

    let received = snapshots(&events);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].collection, "users");
    assert_eq!(received[0].len(), 1);
}

#[test]
fn every_write_publishes_a_full_snapshot_in_insert_order() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let (listener, events) = recording_listener();
    let _subscription = store.subscribe("users", listener).unwrap();

    let first = store.insert("users", fields(json!({"name": "first"}))).unwrap();
    let second = store.insert("users", fields(json!({"name": "second"}))).unwrap();
    store
        .update("users", &first, fields(json!({"name": "first-renamed"})))
        .unwrap();

    let received = snapshots(&events);
    assert_eq!(received.len(), 4);
    assert!(received[0].is_empty());
    assert_eq!(received[2].len(), 2);

    let last = &received[3];
    let ids: Vec<&DocumentId> = last.documents.iter().map(|doc| &doc.id).collect();
    assert_eq!(ids, vec![&first, &second]);
    assert_eq!(
        last.documents[0].fields.get("name"),
        Some(&json!("first-renamed"))
    );
}

#[test]
fn insert_assigns_distinct_store_ids() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let a = store.insert("users", Fields::new()).unwrap();
    let b = store.insert("users", Fields::new()).unwrap();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 32);
}

#[test]
fn update_merges_top_level_fields() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let id = store
        .insert("users", fields(json!({"name": "Ann", "email": "ann@x.com", "age": 30})))
        .unwrap();

    store
        .update("users", &id, fields(json!({"age": 31})))
        .unwrap();

    let snapshot = store.snapshot("users").unwrap();
    let doc = &snapshot.documents[0];
    assert_eq!(doc.fields.get("name"), Some(&json!("Ann")));
    assert_eq!(doc.fields.get("age"), Some(&json!(31)));
}

#[test]
fn update_missing_document_returns_not_found() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let missing = DocumentId::from("missing");
    let err = store
        .update("users", &missing, fields(json!({"age": 1})))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { ref id, .. } if *id == missing));
}

#[test]
fn delete_removes_document_and_missing_delete_succeeds() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let id = store.insert("users", fields(json!({"name": "gone"}))).unwrap();

    store.delete("users", &id).unwrap();
    assert!(store.snapshot("users").unwrap().is_empty());

    store.delete("users", &id).unwrap();
}

#[test]
fn collections_are_isolated() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let (listener, events) = recording_listener();
    let _subscription = store.subscribe("users", listener).unwrap();

    store.insert("audit", fields(json!({"kind": "login"}))).unwrap();

    assert_eq!(snapshots(&events).len(), 1);
    assert!(store.snapshot("users").unwrap().is_empty());
    assert_eq!(store.snapshot("audit").unwrap().len(), 1);
}

#[test]
fn dropping_subscription_stops_delivery() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let (listener, events) = recording_listener();
    let subscription = store.subscribe("users", listener).unwrap();
    assert_eq!(store.subscription_count(), 1);

    drop(subscription);
    assert_eq!(store.subscription_count(), 0);

    store.insert("users", fields(json!({"name": "late"}))).unwrap();
    assert_eq!(snapshots(&events).len(), 1);
}

#[test]
fn invalid_collection_names_are_rejected() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let (listener, _events) = recording_listener();

    assert!(matches!(
        store.subscribe("", listener),
        Err(StoreError::InvalidCollection(_))
    ));
    assert!(matches!(
        store.insert("users/nested", Fields::new()),
        Err(StoreError::InvalidCollection(_))
    ));
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.db");

    let id = {
        let store = SqliteDocumentStore::open(&path).unwrap();
        store.insert("users", fields(json!({"name": "kept"}))).unwrap()
    };

    let reopened = SqliteDocumentStore::open(&path).unwrap();
    let snapshot = reopened.snapshot("users").unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.documents[0].id, id);
}

#[test]
fn rows_with_non_object_bodies_are_left_out_of_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.db");

    let kept = {
        let store = SqliteDocumentStore::open(&path).unwrap();
        store
            .insert("users", fields(json!({"name": "Alice", "email": "a@x.com", "age": 30})))
            .unwrap()
    };
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO documents (collection, id, fields) VALUES ('users', 'bad', '[1,2]');",
        [],
    )
    .unwrap();
    drop(conn);

    let store = SqliteDocumentStore::open(&path).unwrap();
    let (listener, events) = recording_listener();
    let _subscription = store.subscribe("users", listener).unwrap();

    let received = snapshots(&events);
    assert_eq!(received.len(), 1);
    let ids: Vec<&DocumentId> = received[0].documents.iter().map(|doc| &doc.id).collect();
    assert_eq!(ids, vec![&kept]);

    let later = store.insert("users", fields(json!({"name": "Ben"}))).unwrap();
    let latest = store.snapshot("users").unwrap();
    let ids: Vec<&DocumentId> = latest.documents.iter().map(|doc| &doc.id).collect();
    assert_eq!(ids, vec![&kept, &later]);
}

#[test]
fn no_delivery_after_drop_returns_while_another_thread_writes() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    let (listener, events) = recording_listener();
    let subscription = store.subscribe("users", listener).unwrap();

    let writer_store = store.clone();
    let writer = std::thread::spawn(move || {
        for index in 0..200 {
            writer_store
                .insert("users", fields(json!({"name": format!("user-{index}")})))
                .unwrap();
        }
    });

    while events.lock().unwrap().len() < 5 {
        std::thread::yield_now();
    }
    drop(subscription);
    let delivered_at_drop = events.lock().unwrap().len();

    writer.join().unwrap();
    assert_eq!(events.lock().unwrap().len(), delivered_at_drop);
    assert_eq!(store.subscription_count(), 0);
}
