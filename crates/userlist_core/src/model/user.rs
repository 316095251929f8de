//! User record model.
//!
//! # Responsibility
//! - Map store documents into `User` records.
//! - Serialize validated `UserFields` into store documents.
//! - Hold transient form input as `UserDraft`.
//!
//! # Invariants
//! - `User::id` always comes from the store document id.
//! - Decoding does not re-apply form validation rules.

use crate::store::{Document, DocumentId, Fields};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Collection holding user documents.
pub const USERS_COLLECTION: &str = "users";

/// Stable identifier of a user record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = DocumentId;

/// Document body of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    /// Stored as a JSON number.
    pub age: u32,
}

impl UserFields {
    /// Converts fields into a store document body.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), self.name.clone().into());
        fields.insert("email".to_string(), self.email.clone().into());
        fields.insert("age".to_string(), self.age.into());
        fields
    }
}

/// User record as rendered by the list screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: u32,
}

impl User {
    /// Builds a record by merging a store id with document fields.
    pub fn from_parts(id: UserId, fields: UserFields) -> Self {
        Self {
            id,
            name: fields.name,
            email: fields.email,
            age: fields.age,
        }
    }

    /// Decodes one store document.
    ///
    /// # Errors
    /// - Returns `UserDecodeError` when a field is missing or mistyped.
    pub fn from_document(document: &Document) -> Result<Self, UserDecodeError> {
        let fields: UserFields =
            serde_json::from_value(serde_json::Value::Object(document.fields.clone())).map_err(
                |err| UserDecodeError {
                    id: document.id.clone(),
                    message: err.to_string(),
                },
            )?;
        Ok(Self::from_parts(document.id.clone(), fields))
    }

    /// Returns a draft prefilled from this record, used to enter edit mode.
    pub fn to_draft(&self) -> UserDraft {
        UserDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age.to_string(),
        }
    }
}

/// Document that could not be mapped to a `User`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDecodeError {
    pub id: DocumentId,
    pub message: String,
}

impl Display for UserDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid user document `{}`: {}", self.id, self.message)
    }
}

impl Error for UserDecodeError {}

/// Unsaved form input. Every field is the raw text the user typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub age: String,
}

/// Addressable field of a `UserDraft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Email,
    Age,
}

impl UserDraft {
    /// Replaces one field value.
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Name => self.name = value,
            DraftField::Email => self.email = value,
            DraftField::Age => self.age = value,
        }
    }
}
