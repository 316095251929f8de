//! Domain model for user records and their form drafts.
//!
//! # Responsibility
//! - Define the record shape rendered by the list screen.
//! - Define the document field shape written to the store.
//!
//! # Invariants
//! - Record identity is assigned by the store and never edited locally.
//! - The local record list is a cache; the store is the source of truth.

pub mod user;
