//! Immutable-update state container for the user list screen.
//!
//! # Responsibility
//! - Hold every piece of screen state in one value.
//! - Apply screen events through a single reducer.
//!
//! # Invariants
//! - `display` is recomputed by the reducer whenever `users` or `search`
//!   changes and is never written anywhere else.
//! - Form mode is a tagged variant; an edit without an id is unrepresentable.
//! - Once sync has failed, later snapshots are ignored until remount.

use crate::filter::filter_users;
use crate::model::user::{DraftField, User, UserDraft, UserId};
use crate::validate::ValidationError;

/// Lifecycle of the collection subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Waiting for the first snapshot.
    Loading,
    /// At least one snapshot has been applied.
    Live,
    /// Subscription reported an error; no automatic retry.
    Failed,
}

/// Active form, if any, with the draft it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Viewing,
    Creating(UserDraft),
    Editing { id: UserId, draft: UserDraft },
}

impl FormMode {
    pub fn draft(&self) -> Option<&UserDraft> {
        match self {
            Self::Viewing => None,
            Self::Creating(draft) | Self::Editing { draft, .. } => Some(draft),
        }
    }

    /// Id of the record being edited.
    pub fn editing_id(&self) -> Option<&UserId> {
        match self {
            Self::Editing { id, .. } => Some(id),
            _ => None,
        }
    }

    fn draft_mut(&mut self) -> Option<&mut UserDraft> {
        match self {
            Self::Viewing => None,
            Self::Creating(draft) | Self::Editing { draft, .. } => Some(draft),
        }
    }
}

/// Store write issued by a mutation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Input to the screen reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    SnapshotReceived(Vec<User>),
    SubscriptionFailed(String),
    SearchChanged(String),
    CreateStarted,
    EditStarted(User),
    DraftChanged(DraftField, String),
    FormCancelled,
    ValidationFailed(ValidationError),
    MutationStarted(MutationKind),
    MutationSucceeded(MutationKind),
    MutationFailed(MutationKind, String),
    BannerDismissed,
}

/// Complete state of one mounted screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenState {
    users: Vec<User>,
    search: String,
    display: Vec<User>,
    sync: SyncStatus,
    form: FormMode,
    busy: bool,
    banner: Option<String>,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            search: String::new(),
            display: Vec::new(),
            sync: SyncStatus::Loading,
            form: FormMode::Viewing,
            busy: false,
            banner: None,
        }
    }
}

impl ScreenState {
    /// Authoritative list from the latest snapshot.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Authoritative list filtered by the current search.
    pub fn display(&self) -> &[User] {
        &self.display
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sync(&self) -> SyncStatus {
        self.sync
    }

    pub fn is_loading(&self) -> bool {
        self.sync == SyncStatus::Loading
    }

    pub fn form(&self) -> &FormMode {
        &self.form
    }

    /// Whether a store write is in flight. Display hint only.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Looks up a record in the authoritative list.
    pub fn find_user(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|user| &user.id == id)
    }

    /// Applies one event and returns the next state.
    pub fn reduce(mut self, event: ScreenEvent) -> Self {
        match event {
            ScreenEvent::SnapshotReceived(users) => {
                if self.sync == SyncStatus::Failed {
                    return self;
                }
                self.users = users;
                self.sync = SyncStatus::Live;
                self.refilter();
            }
            ScreenEvent::SubscriptionFailed(message) => {
                self.sync = SyncStatus::Failed;
                self.banner = Some(message);
            }
            ScreenEvent::SearchChanged(search) => {
                self.search = search;
                self.refilter();
            }
            ScreenEvent::CreateStarted => {
                self.form = FormMode::Creating(UserDraft::default());
            }
            ScreenEvent::EditStarted(user) => {
                self.form = FormMode::Editing {
                    draft: user.to_draft(),
                    id: user.id,
                };
            }
            ScreenEvent::DraftChanged(field, value) => {
                if let Some(draft) = self.form.draft_mut() {
                    draft.set(field, value);
                }
            }
            ScreenEvent::FormCancelled => {
                self.form = FormMode::Viewing;
            }
            ScreenEvent::ValidationFailed(err) => {
                self.banner = Some(err.to_string());
            }
            ScreenEvent::MutationStarted(_) => {
                self.busy = true;
            }
            ScreenEvent::MutationSucceeded(kind) => {
                self.busy = false;
                if matches!(kind, MutationKind::Create | MutationKind::Update) {
                    self.form = FormMode::Viewing;
                }
            }
            ScreenEvent::MutationFailed(_, message) => {
                self.busy = false;
                self.banner = Some(message);
            }
            ScreenEvent::BannerDismissed => {
                self.banner = None;
            }
        }
        self
    }

    fn refilter(&mut self) {
        self.display = filter_users(&self.users, &self.search);
    }
}

#[cfg(test)]
mod tests {
    use super::{FormMode, MutationKind, ScreenEvent, ScreenState, SyncStatus};
    use crate::model::user::{DraftField, User, UserDraft};
    use crate::store::DocumentId;
    use crate::validate::ValidationError;

    fn user(id: &str, name: &str, email: &str) -> User {
        User {
            id: DocumentId::from(id),
            name: name.to_string(),
            email: email.to_string(),
            age: 20,
        }
    }

    fn live_state() -> ScreenState {
        ScreenState::default().reduce(ScreenEvent::SnapshotReceived(vec![
            user("1", "Alice", "alice@x.com"),
            user("2", "Bob", "bob@y.com"),
        ]))
    }

    #[test]
    fn starts_loading_with_no_form() {
        let state = ScreenState::default();
        assert!(state.is_loading());
        assert_eq!(state.form(), &FormMode::Viewing);
        assert!(state.display().is_empty());
    }

    #[test]
    fn snapshot_replaces_users_and_keeps_search_applied() {
        let state = live_state().reduce(ScreenEvent::SearchChanged("bob".to_string()));
        assert_eq!(state.display().len(), 1);

        let state = state.reduce(ScreenEvent::SnapshotReceived(vec![
            user("3", "Bobby", "b@z.com"),
            user("4", "Dan", "dan@bob.org"),
            user("5", "Eve", "eve@x.com"),
        ]));
        assert_eq!(state.sync(), SyncStatus::Live);
        assert_eq!(state.users().len(), 3);
        let ids: Vec<&str> = state.display().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4"]);
    }

    #[test]
    fn subscription_failure_ends_loading_and_freezes_list() {
        let state = ScreenState::default()
            .reduce(ScreenEvent::SubscriptionFailed("permission denied".to_string()));
        assert_eq!(state.sync(), SyncStatus::Failed);
        assert!(!state.is_loading());
        assert_eq!(state.banner(), Some("permission denied"));

        let state = state.reduce(ScreenEvent::SnapshotReceived(vec![user("1", "A", "a")]));
        assert!(state.users().is_empty());
    }

    #[test]
    fn edit_prefills_draft_and_cancel_discards_it() {
        let state = live_state().reduce(ScreenEvent::EditStarted(user("2", "Bob", "bob@y.com")));
        assert_eq!(state.form().editing_id().map(|id| id.as_str()), Some("2"));
        assert_eq!(state.form().draft().map(|d| d.age.as_str()), Some("20"));

        let state = state.reduce(ScreenEvent::FormCancelled);
        assert_eq!(state.form(), &FormMode::Viewing);
    }

    #[test]
    fn draft_changes_are_ignored_without_active_form() {
        let state = live_state().reduce(ScreenEvent::DraftChanged(DraftField::Name, "x".into()));
        assert_eq!(state.form(), &FormMode::Viewing);

        let state = state
            .reduce(ScreenEvent::CreateStarted)
            .reduce(ScreenEvent::DraftChanged(DraftField::Name, "Zed".into()));
        assert_eq!(
            state.form(),
            &FormMode::Creating(UserDraft {
                name: "Zed".to_string(),
                ..UserDraft::default()
            })
        );
    }

    #[test]
    fn mutation_lifecycle_toggles_busy_and_clears_form_on_success() {
        let state = live_state()
            .reduce(ScreenEvent::CreateStarted)
            .reduce(ScreenEvent::MutationStarted(MutationKind::Create));
        assert!(state.is_busy());

        let state = state.reduce(ScreenEvent::MutationSucceeded(MutationKind::Create));
        assert!(!state.is_busy());
        assert_eq!(state.form(), &FormMode::Viewing);
    }

    #[test]
    fn mutation_failure_keeps_draft_and_sets_banner() {
        let state = live_state()
            .reduce(ScreenEvent::CreateStarted)
            .reduce(ScreenEvent::DraftChanged(DraftField::Name, "Zed".into()))
            .reduce(ScreenEvent::MutationStarted(MutationKind::Create))
            .reduce(ScreenEvent::MutationFailed(
                MutationKind::Create,
                "offline".to_string(),
            ));
        assert!(!state.is_busy());
        assert_eq!(state.banner(), Some("offline"));
        assert_eq!(state.form().draft().map(|d| d.name.as_str()), Some("Zed"));
    }

    #[test]
    fn delete_success_leaves_form_untouched() {
        let state = live_state()
            .reduce(ScreenEvent::EditStarted(user("1", "Alice", "alice@x.com")))
            .reduce(ScreenEvent::MutationSucceeded(MutationKind::Delete));
        assert!(state.form().editing_id().is_some());
    }

    #[test]
    fn validation_failure_uses_banner_and_dismiss_clears_it() {
        let state = live_state().reduce(ScreenEvent::ValidationFailed(
            ValidationError::InvalidEmail,
        ));
        assert_eq!(state.banner(), Some("invalid email"));
        assert_eq!(state.reduce(ScreenEvent::BannerDismissed).banner(), None);
    }
}
