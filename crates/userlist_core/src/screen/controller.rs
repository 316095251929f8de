//! Screen controller: sync listener and mutation handlers.
//!
//! # Responsibility
//! - Subscribe to the users collection for the screen lifetime.
//! - Validate drafts and issue exactly one store write per handler call.
//! - Reflect in-flight writes and failures in screen state.
//!
//! # Invariants
//! - The state lock is never held across a store call.
//! - Local records are never changed speculatively; only snapshots do that.
//! - Validation failures never reach the store.

use super::state::{FormMode, MutationKind, ScreenEvent, ScreenState};
use crate::model::user::{DraftField, UserDraft, UserFields, UserId, USERS_COLLECTION};
use crate::store::{DocumentStore, SnapshotListener, StoreError, Subscription};
use crate::sync::users_from_snapshot;
use crate::validate::{validate_draft, ValidationError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Error returned by screen operations.
///
/// Every variant is also reflected in screen state where applicable, so
/// callers may ignore the return value and render state alone.
#[derive(Debug)]
pub enum ScreenError {
    /// Draft rejected before any store call.
    Validation(ValidationError),
    /// Store rejected or failed the write.
    Store(StoreError),
    /// Operation needs an open create/edit form.
    NoActiveForm,
    /// Update requested while no record is being edited.
    NoActiveRecord,
    /// Id is not in the authoritative list.
    RecordNotFound(UserId),
}

impl Display for ScreenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NoActiveForm => write!(f, "no form is open"),
            Self::NoActiveRecord => write!(f, "no record is being edited"),
            Self::RecordNotFound(id) => write!(f, "user not found: {id}"),
        }
    }
}

impl Error for ScreenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ScreenError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ScreenError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of a successful form submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(UserId),
    Updated(UserId),
}

/// One mounted user list screen.
///
/// Dropping the screen releases its subscription.
pub struct UserListScreen<S: DocumentStore> {
    // Declared first so it is released before anything else.
    subscription: Option<Subscription>,
    state: Arc<Mutex<ScreenState>>,
    store: S,
}

impl<S: DocumentStore> UserListScreen<S> {
    /// Mounts the screen and subscribes to the users collection.
    ///
    /// Never fails: a subscription error moves sync status to `Failed` and
    /// shows the error in the banner.
    pub fn mount(store: S) -> Self {
        let state = Arc::new(Mutex::new(ScreenState::default()));
        let listener = sync_listener(&state);

        let subscription = match store.subscribe(USERS_COLLECTION, listener) {
            Ok(subscription) => {
                info!(
                    "event=screen_mount module=screen status=ok collection={}",
                    USERS_COLLECTION
                );
                Some(subscription)
            }
            Err(err) => {
                error!(
                    "event=screen_mount module=screen status=error collection={} error={}",
                    USERS_COLLECTION, err
                );
                dispatch(&state, ScreenEvent::SubscriptionFailed(err.to_string()));
                None
            }
        };

        Self {
            subscription,
            state,
            store,
        }
    }

    /// Tears the screen down. Equivalent to dropping it.
    pub fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        info!("event=screen_unmount module=screen status=ok");
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> ScreenState {
        lock(&self.state).clone()
    }

    pub fn set_search(&self, search: impl Into<String>) {
        dispatch(&self.state, ScreenEvent::SearchChanged(search.into()));
    }

    /// Opens an empty create form, replacing any open form.
    pub fn begin_create(&self) {
        dispatch(&self.state, ScreenEvent::CreateStarted);
    }

    /// Opens the edit form prefilled from the record with `id`.
    pub fn begin_edit(&self, id: &UserId) -> Result<(), ScreenError> {
        let user = lock(&self.state)
            .find_user(id)
            .cloned()
            .ok_or_else(|| ScreenError::RecordNotFound(id.clone()))?;
        dispatch(&self.state, ScreenEvent::EditStarted(user));
        Ok(())
    }

    /// Replaces one field of the open draft.
    pub fn set_draft_field(
        &self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), ScreenError> {
        let mut guard = lock(&self.state);
        if guard.form().draft().is_none() {
            return Err(ScreenError::NoActiveForm);
        }
        let current = std::mem::take(&mut *guard);
        *guard = current.reduce(ScreenEvent::DraftChanged(field, value.into()));
        Ok(())
    }

    /// Replaces the whole open draft.
    pub fn set_draft(&self, draft: UserDraft) -> Result<(), ScreenError> {
        self.set_draft_field(DraftField::Name, draft.name)?;
        self.set_draft_field(DraftField::Email, draft.email)?;
        self.set_draft_field(DraftField::Age, draft.age)
    }

    /// Closes the open form and discards its draft.
    pub fn cancel_form(&self) {
        dispatch(&self.state, ScreenEvent::FormCancelled);
    }

    pub fn dismiss_banner(&self) {
        dispatch(&self.state, ScreenEvent::BannerDismissed);
    }

    /// Submits the open form as a create or an update.
    pub fn submit(&self) -> Result<SubmitOutcome, ScreenError> {
        match self.form() {
            FormMode::Viewing => Err(ScreenError::NoActiveForm),
            FormMode::Creating(draft) => self.run_create(&draft).map(SubmitOutcome::Created),
            FormMode::Editing { id, draft } => {
                self.run_update(&id, &draft)?;
                Ok(SubmitOutcome::Updated(id))
            }
        }
    }

    /// Inserts the create-form draft as a new record.
    ///
    /// The form closes only after the store accepts the insert; the record
    /// itself appears with the next snapshot.
    pub fn create(&self) -> Result<UserId, ScreenError> {
        match self.form() {
            FormMode::Creating(draft) => self.run_create(&draft),
            _ => Err(ScreenError::NoActiveForm),
        }
    }

    /// Writes the edit-form draft to the record being edited.
    pub fn update(&self) -> Result<UserId, ScreenError> {
        match self.form() {
            FormMode::Editing { id, draft } => {
                self.run_update(&id, &draft)?;
                Ok(id)
            }
            _ => Err(ScreenError::NoActiveRecord),
        }
    }

    /// Deletes the record with `id`.
    ///
    /// The id is sent as given; the current filter and list contents are not
    /// consulted.
    pub fn delete(&self, id: &UserId) -> Result<(), ScreenError> {
        self.run_mutation(MutationKind::Delete, || {
            self.store.delete(USERS_COLLECTION, id)
        })
    }

    fn form(&self) -> FormMode {
        lock(&self.state).form().clone()
    }

    fn run_create(&self, draft: &UserDraft) -> Result<UserId, ScreenError> {
        let fields = self.validate(MutationKind::Create, draft)?;
        self.run_mutation(MutationKind::Create, || {
            self.store.insert(USERS_COLLECTION, fields.to_fields())
        })
    }

    fn run_update(&self, id: &UserId, draft: &UserDraft) -> Result<(), ScreenError> {
        let fields = self.validate(MutationKind::Update, draft)?;
        self.run_mutation(MutationKind::Update, || {
            self.store.update(USERS_COLLECTION, id, fields.to_fields())
        })
    }

    fn validate(&self, kind: MutationKind, draft: &UserDraft) -> Result<UserFields, ScreenError> {
        validate_draft(draft).map_err(|err| {
            warn!(
                "event=user_{} module=screen status=rejected reason={:?}",
                kind.as_str(),
                err
            );
            dispatch(&self.state, ScreenEvent::ValidationFailed(err));
            ScreenError::Validation(err)
        })
    }

    fn run_mutation<T>(
        &self,
        kind: MutationKind,
        call: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, ScreenError> {
        let started_at = Instant::now();
        info!("event=user_{} module=screen status=start", kind.as_str());
        dispatch(&self.state, ScreenEvent::MutationStarted(kind));

        match call() {
            Ok(value) => {
                dispatch(&self.state, ScreenEvent::MutationSucceeded(kind));
                info!(
                    "event=user_{} module=screen status=ok duration_ms={}",
                    kind.as_str(),
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                error!(
                    "event=user_{} module=screen status=error duration_ms={} error={}",
                    kind.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                dispatch(
                    &self.state,
                    ScreenEvent::MutationFailed(kind, err.to_string()),
                );
                Err(ScreenError::Store(err))
            }
        }
    }
}

fn sync_listener(state: &Arc<Mutex<ScreenState>>) -> SnapshotListener {
    let weak = Arc::downgrade(state);
    Arc::new(move |event| {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let screen_event = match event {
            Ok(snapshot) => {
                let users = users_from_snapshot(&snapshot);
                info!(
                    "event=snapshot_apply module=sync status=ok documents={} users={}",
                    snapshot.len(),
                    users.len()
                );
                ScreenEvent::SnapshotReceived(users)
            }
            Err(err) => {
                error!(
                    "event=snapshot_apply module=sync status=error error={}",
                    err
                );
                ScreenEvent::SubscriptionFailed(err.to_string())
            }
        };
        dispatch(&state, screen_event);
    })
}

fn dispatch(state: &Mutex<ScreenState>, event: ScreenEvent) {
    let mut guard = lock(state);
    let current = std::mem::take(&mut *guard);
    *guard = current.reduce(event);
}

fn lock(state: &Mutex<ScreenState>) -> MutexGuard<'_, ScreenState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
