//! Snapshot-to-record mapping for the sync listener.
//!
//! # Responsibility
//! - Rebuild the authoritative user list from a full collection snapshot.
//!
//! # Invariants
//! - Output is built from scratch; no previous local state is consulted.
//! - Undecodable documents are skipped and logged, never half-mapped.

use crate::model::user::User;
use crate::store::Snapshot;
use log::warn;

/// Maps every decodable document in `snapshot` to a `User`, in store order.
pub fn users_from_snapshot(snapshot: &Snapshot) -> Vec<User> {
    let mut users = Vec::with_capacity(snapshot.len());
    for document in &snapshot.documents {
        match User::from_document(document) {
            Ok(user) => users.push(user),
            Err(err) => {
                warn!(
                    "event=snapshot_decode module=sync status=skipped collection={} doc_id={} error={}",
                    snapshot.collection, err.id, err.message
                );
            }
        }
    }
    users
}
