//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page (latest + featured books)
//! GET  /health                   - Health check
//!
//! # Catalogue
//! GET  /catalogue                - Filtered, sorted, paginated book listing
//! GET  /catalogue/book/{id}      - Book detail with similar books
//!
//! # Cart (login required)
//! GET  /cart                     - Cart page
//! POST /cart/add/{id}            - Add a book
//! POST /cart/update/{id}         - Change a quantity (0 removes)
//! POST /cart/remove/{id}         - Remove a book
//! POST /cart/clear               - Empty the cart
//!
//! # Checkout (login required)
//! GET  /checkout                 - Order confirmation page
//! POST /checkout                 - Place the order
//!
//! # Auth
//! GET/POST /login                - Login form / action
//! GET/POST /register             - Registration form / action
//! POST /logout                   - Logout action
//! GET/POST /forgot-password      - Password-reset request
//! GET/POST /reset-password/{token} - Password-reset confirmation
//!
//! # Profile (login required)
//! GET  /profile                  - Details and order history
//! GET/POST /profile/edit         - Contact/address edit
//! GET/POST /profile/change-password
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalogue;
pub mod checkout;
pub mod home;
pub mod password_reset;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, Flash, flash};
use crate::state::AppState;

/// Context shared by every rendered page: header identity and flashes.
pub struct PageContext {
    pub user_name: Option<String>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Gather the page context, draining pending flash messages.
    pub async fn build(session: &Session, user: Option<&CurrentUser>) -> Self {
        Self {
            user_name: user.map(|u| u.first_name.clone()),
            flashes: flash::take(session).await,
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route(
            "/forgot-password",
            get(password_reset::forgot_password_page).post(password_reset::request_reset),
        )
        .route(
            "/reset-password/{token}",
            get(password_reset::reset_page).post(password_reset::reset),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{id}", post(cart::add))
        .route("/update/{id}", post(cart::update))
        .route("/remove/{id}", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/edit", get(account::edit_page).post(account::edit))
        .route(
            "/change-password",
            get(account::change_password_page).post(account::change_password),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/catalogue", get(catalogue::index))
        .route("/catalogue/book/{id}", get(catalogue::show))
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            get(checkout::confirm_page).post(checkout::place_order),
        )
        .nest("/profile", profile_routes())
        .merge(auth_routes())
}
