//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the user list screen core to Dart via FRB.
//! - Flatten screen state into plain view envelopes for rendering.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - At most one screen is mounted per process; mounting again replaces it.
//! - One store is opened per process and shared by every mount.

use std::sync::{Mutex, MutexGuard, PoisonError};
use userlist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_store,
    ping as ping_inner, DocumentId, FormMode, ScreenState, SqliteDocumentStore, StoreConfig,
    SubmitOutcome, SyncStatus, User, UserDraft, UserListScreen,
};

type Screen = UserListScreen<SqliteDocumentStore>;

static STORE: Mutex<Option<SqliteDocumentStore>> = Mutex::new(None);
static SCREEN: Mutex<Option<Screen>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One row of the rendered user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub age: u32,
}

/// Render-ready copy of the screen state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersView {
    /// Whether a screen is mounted. All other fields are empty when false.
    pub mounted: bool,
    /// Display list (search applied).
    pub items: Vec<UserItem>,
    /// Size of the unfiltered list.
    pub total: u32,
    pub search: String,
    /// `loading|live|failed`.
    pub sync: String,
    pub busy: bool,
    pub banner: Option<String>,
    /// `viewing|creating|editing`.
    pub form_mode: String,
    pub editing_id: Option<String>,
    pub draft_name: String,
    pub draft_email: String,
    pub draft_age: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected user id, when there is one.
    pub user_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl UsersActionResponse {
    fn success(message: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            ok: true,
            user_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            user_id: None,
            message: message.into(),
        }
    }
}

/// Mounts the users screen, replacing any mounted one.
///
/// # FFI contract
/// - Opens the process store on first call (`USERLIST_DB_PATH` or temp dir).
/// - Subscription failures are reported through `users_view().banner`.
#[flutter_rust_bridge::frb(sync)]
pub fn users_mount() -> UsersActionResponse {
    let store = match resolve_store() {
        Ok(store) => store,
        Err(err) => return UsersActionResponse::failure(format!("users_mount failed: {err}")),
    };
    let mut slot = lock(&SCREEN);
    if let Some(previous) = slot.take() {
        previous.unmount();
    }
    *slot = Some(UserListScreen::mount(store));
    UsersActionResponse::success("Screen mounted.", None)
}

/// Unmounts the users screen and releases its subscription.
#[flutter_rust_bridge::frb(sync)]
pub fn users_unmount() -> UsersActionResponse {
    match lock(&SCREEN).take() {
        Some(screen) => {
            screen.unmount();
            UsersActionResponse::success("Screen unmounted.", None)
        }
        None => UsersActionResponse::success("Screen was not mounted.", None),
    }
}

/// Returns the current render-ready view.
#[flutter_rust_bridge::frb(sync)]
pub fn users_view() -> UsersView {
    match lock(&SCREEN).as_ref() {
        Some(screen) => to_users_view(&screen.state()),
        None => unmounted_view(),
    }
}

/// Updates the search text and returns the refreshed view.
#[flutter_rust_bridge::frb(sync)]
pub fn users_set_search(text: String) -> UsersView {
    match lock(&SCREEN).as_ref() {
        Some(screen) => {
            screen.set_search(text);
            to_users_view(&screen.state())
        }
        None => unmounted_view(),
    }
}

/// Opens an empty create form.
#[flutter_rust_bridge::frb(sync)]
pub fn users_begin_create() -> UsersActionResponse {
    respond("users_begin_create", |screen| {
        screen.begin_create();
        Ok(UsersActionResponse::success("Create form opened.", None))
    })
}

/// Opens the edit form for one listed user.
#[flutter_rust_bridge::frb(sync)]
pub fn users_begin_edit(user_id: String) -> UsersActionResponse {
    respond("users_begin_edit", |screen| {
        let id = DocumentId::new(user_id.trim());
        screen.begin_edit(&id).map_err(|err| err.to_string())?;
        Ok(UsersActionResponse::success(
            "Edit form opened.",
            Some(id.to_string()),
        ))
    })
}

/// Replaces the open draft with raw field text.
#[flutter_rust_bridge::frb(sync)]
pub fn users_set_draft(name: String, email: String, age: String) -> UsersActionResponse {
    respond("users_set_draft", |screen| {
        screen
            .set_draft(UserDraft { name, email, age })
            .map_err(|err| err.to_string())?;
        Ok(UsersActionResponse::success("Draft updated.", None))
    })
}

/// Closes the open form without saving.
#[flutter_rust_bridge::frb(sync)]
pub fn users_cancel_form() -> UsersActionResponse {
    respond("users_cancel_form", |screen| {
        screen.cancel_form();
        Ok(UsersActionResponse::success("Form closed.", None))
    })
}

/// Submits the open form.
///
/// # FFI contract
/// - DB-backed execution; the list refreshes through the subscription.
/// - Validation and store errors return `ok=false` with the banner text.
#[flutter_rust_bridge::frb(sync)]
pub fn users_submit() -> UsersActionResponse {
    respond("users_submit", |screen| match screen.submit() {
        Ok(SubmitOutcome::Created(id)) => Ok(UsersActionResponse::success(
            "User created.",
            Some(id.to_string()),
        )),
        Ok(SubmitOutcome::Updated(id)) => Ok(UsersActionResponse::success(
            "User updated.",
            Some(id.to_string()),
        )),
        Err(err) => Err(err.to_string()),
    })
}

/// Deletes one user by id without confirmation.
#[flutter_rust_bridge::frb(sync)]
pub fn users_delete(user_id: String) -> UsersActionResponse {
    respond("users_delete", |screen| {
        let id = DocumentId::new(user_id.trim());
        screen.delete(&id).map_err(|err| err.to_string())?;
        Ok(UsersActionResponse::success(
            "User deleted.",
            Some(id.to_string()),
        ))
    })
}

/// Clears the banner message.
#[flutter_rust_bridge::frb(sync)]
pub fn users_dismiss_banner() -> UsersActionResponse {
    respond("users_dismiss_banner", |screen| {
        screen.dismiss_banner();
        Ok(UsersActionResponse::success("Banner dismissed.", None))
    })
}

fn respond(
    op: &str,
    f: impl FnOnce(&Screen) -> Result<UsersActionResponse, String>,
) -> UsersActionResponse {
    let slot = lock(&SCREEN);
    let Some(screen) = slot.as_ref() else {
        return UsersActionResponse::failure(format!("{op} failed: screen is not mounted"));
    };
    match f(screen) {
        Ok(response) => response,
        Err(message) => {
            log::warn!("event=ffi_call module=ffi status=error op={op}");
            UsersActionResponse::failure(message)
        }
    }
}

fn resolve_store() -> Result<SqliteDocumentStore, String> {
    let mut slot = lock(&STORE);
    if let Some(store) = slot.as_ref() {
        return Ok(store.clone());
    }
    let store = open_store(&StoreConfig::from_env()).map_err(|err| err.to_string())?;
    *slot = Some(store.clone());
    Ok(store)
}

fn to_users_view(state: &ScreenState) -> UsersView {
    let (form_mode, editing_id) = match state.form() {
        FormMode::Viewing => ("viewing", None),
        FormMode::Creating(_) => ("creating", None),
        FormMode::Editing { id, .. } => ("editing", Some(id.to_string())),
    };
    let draft = state.form().draft().cloned().unwrap_or_default();

    UsersView {
        mounted: true,
        items: state.display().iter().map(to_user_item).collect(),
        total: u32::try_from(state.users().len()).unwrap_or(u32::MAX),
        search: state.search().to_string(),
        sync: sync_label(state.sync()).to_string(),
        busy: state.is_busy(),
        banner: state.banner().map(str::to_string),
        form_mode: form_mode.to_string(),
        editing_id,
        draft_name: draft.name,
        draft_email: draft.email,
        draft_age: draft.age,
    }
}

fn unmounted_view() -> UsersView {
    UsersView {
        mounted: false,
        items: Vec::new(),
        total: 0,
        search: String::new(),
        sync: String::new(),
        busy: false,
        banner: None,
        form_mode: String::new(),
        editing_id: None,
        draft_name: String::new(),
        draft_email: String::new(),
        draft_age: String::new(),
    }
}

fn to_user_item(user: &User) -> UserItem {
    UserItem {
        user_id: user.id.to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
        age: user.age,
    }
}

fn sync_label(sync: SyncStatus) -> &'static str {
    match sync {
        SyncStatus::Loading => "loading",
        SyncStatus::Live => "live",
        SyncStatus::Failed => "failed",
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
