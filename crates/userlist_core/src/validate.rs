//! Form input validation for user records.
//!
//! # Responsibility
//! - Turn raw draft text into store-ready `UserFields`.
//! - Report exactly one human-readable reason when input is rejected.
//!
//! # Invariants
//! - Rules are evaluated in a fixed order and the first failure wins:
//!   name presence, name length, email presence, email format, age presence,
//!   age numeric, age range.
//! - Validation never touches the store.

use crate::model::user::{UserDraft, UserFields};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Minimum number of characters in a trimmed name.
pub const NAME_MIN_CHARS: usize = 3;
/// Accepted age range, inclusive.
pub const AGE_RANGE: RangeInclusive<u32> = 1..=120;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static AGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid age regex"));

/// First failing validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    NameRequired,
    NameTooShort,
    EmailRequired,
    InvalidEmail,
    AgeRequired,
    AgeNotNumber,
    AgeOutOfRange,
}

impl ValidationError {
    /// Banner text shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            Self::NameRequired => "name required",
            Self::NameTooShort => "name too short",
            Self::EmailRequired => "email required",
            Self::InvalidEmail => "invalid email",
            Self::AgeRequired => "age required",
            Self::AgeNotNumber => "age must be a number",
            Self::AgeOutOfRange => "age out of range",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for ValidationError {}

/// Validates raw form input.
///
/// Returns trimmed name/email and the parsed age on success.
///
/// # Errors
/// - Returns the first failing rule as `ValidationError`.
pub fn validate_user_input(
    name: &str,
    email: &str,
    age: &str,
) -> Result<UserFields, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() < NAME_MIN_CHARS {
        return Err(ValidationError::NameTooShort);
    }

    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }

    let age = age.trim();
    if age.is_empty() {
        return Err(ValidationError::AgeRequired);
    }
    if !AGE_RE.is_match(age) {
        return Err(ValidationError::AgeNotNumber);
    }
    // Any integer literal is a number; overflow is just far out of range.
    let age = age
        .parse::<i64>()
        .ok()
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| AGE_RANGE.contains(value))
        .ok_or(ValidationError::AgeOutOfRange)?;

    Ok(UserFields {
        name: name.to_string(),
        email: email.to_string(),
        age,
    })
}

/// Validates a form draft.
pub fn validate_draft(draft: &UserDraft) -> Result<UserFields, ValidationError> {
    validate_user_input(&draft.name, &draft.email, &draft.age)
}

#[cfg(test)]
mod tests {
    use super::{validate_user_input, ValidationError};

    #[test]
    fn empty_name_is_required() {
        assert_eq!(
            validate_user_input("", "a@b.com", "30"),
            Err(ValidationError::NameRequired)
        );
        assert_eq!(
            validate_user_input("   ", "", ""),
            Err(ValidationError::NameRequired)
        );
    }

    #[test]
    fn short_name_is_rejected_before_email() {
        let err = validate_user_input("ab", "not-an-email", "").unwrap_err();
        assert_eq!(err, ValidationError::NameTooShort);
        assert_eq!(err.to_string(), "name too short");
    }

    #[test]
    fn email_rules_apply_in_order() {
        assert_eq!(
            validate_user_input("Alice", " ", "30"),
            Err(ValidationError::EmailRequired)
        );
        assert_eq!(
            validate_user_input("Alice", "not-an-email", "30"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_user_input("Alice", "a b@c.com", "30"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_user_input("Alice", "a@b", "30"),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn age_rules_apply_in_order() {
        assert_eq!(
            validate_user_input("Alice", "a@b.com", ""),
            Err(ValidationError::AgeRequired)
        );
        assert_eq!(
            validate_user_input("Alice", "a@b.com", "thirty"),
            Err(ValidationError::AgeNotNumber)
        );
        assert_eq!(
            validate_user_input("Alice", "a@b.com", "200"),
            Err(ValidationError::AgeOutOfRange)
        );
        assert_eq!(
            validate_user_input("Alice", "a@b.com", "0"),
            Err(ValidationError::AgeOutOfRange)
        );
        assert_eq!(
            validate_user_input("Alice", "a@b.com", "-5"),
            Err(ValidationError::AgeOutOfRange)
        );
    }

    #[test]
    fn oversized_integer_age_is_out_of_range() {
        assert_eq!(
            validate_user_input("Alice", "a@b.com", "99999999999999999999"),
            Err(ValidationError::AgeOutOfRange)
        );
        assert_eq!(
            validate_user_input("Alice", "a@b.com", "-99999999999999999999"),
            Err(ValidationError::AgeOutOfRange)
        );
    }

    #[test]
    fn non_integer_age_is_not_a_number() {
        for raw in ["1.5", "3e2", "1 2", "+", "٣٠"] {
            assert_eq!(
                validate_user_input("Alice", "a@b.com", raw),
                Err(ValidationError::AgeNotNumber),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert_eq!(validate_user_input("Alice", "a@b.com", "1").unwrap().age, 1);
        assert_eq!(
            validate_user_input("Alice", "a@b.com", "120").unwrap().age,
            120
        );
    }

    #[test]
    fn valid_input_is_trimmed_and_parsed() {
        let fields = validate_user_input(" Alice ", " a@b.com ", " 30 ").unwrap();
        assert_eq!(fields.name, "Alice");
        assert_eq!(fields.email, "a@b.com");
        assert_eq!(fields.age, 30);
    }
}
