//! Reusable admin UI components.

pub mod entity_admin;
