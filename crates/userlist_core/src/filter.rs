//! Search filter for the display list.
//!
//! # Invariants
//! - Pure: output depends only on `(users, search)`.
//! - Empty search returns every record in original order.
//! - Matching is a case-insensitive substring test on name or email.

use crate::model::user::User;

/// Returns records whose name or email contains `search`, ignoring case.
pub fn filter_users(users: &[User], search: &str) -> Vec<User> {
    if search.is_empty() {
        return users.to_vec();
    }

    let needle = search.to_lowercase();
    users
        .iter()
        .filter(|user| matches_search(user, &needle))
        .cloned()
        .collect()
}

fn matches_search(user: &User, lowered_needle: &str) -> bool {
    user.name.to_lowercase().contains(lowered_needle)
        || user.email.to_lowercase().contains(lowered_needle)
}
