//! Core logic for the user list screen.
//! This crate owns record sync, filtering, validation and form state.

pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod screen;
pub mod store;
pub mod sync;
pub mod validate;

pub use config::{open_store, StoreConfig};
pub use filter::filter_users;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::user::{
    DraftField, User, UserDecodeError, UserDraft, UserFields, UserId, USERS_COLLECTION,
};
pub use screen::{
    FormMode, MutationKind, ScreenError, ScreenEvent, ScreenState, SubmitOutcome, SyncStatus,
    UserListScreen,
};
pub use store::{
    Document, DocumentId, DocumentStore, Fields, Snapshot, SnapshotEvent, SnapshotListener,
    SqliteDocumentStore, StoreError, StoreResult, Subscription,
};
pub use sync::users_from_snapshot;
pub use validate::{validate_draft, validate_user_input, ValidationError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
