//! User list screen core.
//!
//! # Responsibility
//! - Own screen state for one mounted screen lifetime.
//! - Bridge store snapshots into the authoritative list (sync listener).
//! - Run validated create/update/delete against the document store.
//!
//! # Invariants
//! - The display list is derived only from `(users, search)`.
//! - Snapshots are the only writer of the authoritative list.
//! - The subscription is released when the screen is dropped.

mod controller;
mod state;

pub use controller::{ScreenError, SubmitOutcome, UserListScreen};
pub use state::{FormMode, MutationKind, ScreenEvent, ScreenState, SyncStatus};
