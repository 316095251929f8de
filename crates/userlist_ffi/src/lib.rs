//! Flutter bridge crate for the user list screen core.

pub mod api;
