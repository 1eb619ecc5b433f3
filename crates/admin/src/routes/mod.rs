//! HTTP route handlers for the admin panel.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                     - Dashboard (stats, best sellers, low stock)
//! GET  /health               - Health check
//! GET/POST /login            - Admin login (agent role and above)
//! POST /logout               - Logout
//!
//! # Catalogue management (agent+, delete admin-only)
//! GET  /books                - Book list (search, category/publisher/language filters)
//! GET  /books/new  POST /books          - Create
//! GET  /books/{id}/edit  POST /books/{id}  - Edit
//! POST /books/{id}/delete               - Delete
//! (authors, publishers, categories follow the same shape)
//!
//! # Sales (agent+)
//! GET  /orders               - Order list (status filter)
//! GET  /orders/{id}          - Order detail
//! POST /orders/{id}/status   - Status transition
//!
//! # Users (admin only)
//! GET  /users                - User list
//! GET  /users/new  POST /users          - Create (temporary password shown once)
//! GET  /users/{id}/edit  POST /users/{id}  - Edit (optional password rotation)
//! POST /users/{id}/delete               - Delete
//! POST /users/{id}/reset-password       - Generate a fresh temporary password
//!
//! # Settings (admin only)
//! GET/POST /settings         - Key-value configuration
//! ```

pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod dashboard;
pub mod entity_list;
pub mod orders;
pub mod publishers;
pub mod settings;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, Flash, flash};
use crate::state::AppState;

use mybookstore_core::Role;

/// Context shared by every rendered admin page.
pub struct PageContext {
    pub admin_name: String,
    /// Whether the admin-only menu entries (users, settings) are shown.
    pub is_admin: bool,
    pub flashes: Vec<Flash>,
    /// Active navigation slug for highlighting.
    pub active: &'static str,
}

impl PageContext {
    /// Gather the page context, draining pending flash messages.
    pub async fn build(session: &Session, admin: &CurrentAdmin, active: &'static str) -> Self {
        Self {
            admin_name: admin.first_name.clone(),
            is_admin: admin.role.allows(Role::Admin),
            flashes: flash::take(session).await,
            active,
        }
    }
}

/// Common list-page query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl ListQuery {
    /// The 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// The search term, trimmed, `None` when blank.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        // Catalogue
        .route("/books", get(books::list).post(books::create))
        .route("/books/new", get(books::new_page))
        .route("/books/{id}/edit", get(books::edit_page))
        .route("/books/{id}", post(books::update))
        .route("/books/{id}/delete", post(books::delete))
        .route("/authors", get(authors::list).post(authors::create))
        .route("/authors/new", get(authors::new_page))
        .route("/authors/{id}/edit", get(authors::edit_page))
        .route("/authors/{id}", post(authors::update))
        .route("/authors/{id}/delete", post(authors::delete))
        .route("/publishers", get(publishers::list).post(publishers::create))
        .route("/publishers/new", get(publishers::new_page))
        .route("/publishers/{id}/edit", get(publishers::edit_page))
        .route("/publishers/{id}", post(publishers::update))
        .route("/publishers/{id}/delete", post(publishers::delete))
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/new", get(categories::new_page))
        .route("/categories/{id}/edit", get(categories::edit_page))
        .route("/categories/{id}", post(categories::update))
        .route("/categories/{id}/delete", post(categories::delete))
        // Sales
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::detail))
        .route("/orders/{id}/status", post(orders::update_status))
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/new", get(users::new_page))
        .route("/users/{id}/edit", get(users::edit_page))
        .route("/users/{id}", post(users::update))
        .route("/users/{id}/delete", post(users::delete))
        .route("/users/{id}/reset-password", post(users::reset_password))
        // Settings
        .route("/settings", get(settings::index).post(settings::save))
}
