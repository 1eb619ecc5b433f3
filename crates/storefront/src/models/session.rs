//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use mybookstore_core::{CustomerId, Email, Role};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Customer's database ID.
    pub id: CustomerId,
    /// Customer's email address.
    pub email: Email,
    /// Customer's role at login time.
    pub role: Role,
    /// Display name for the header.
    pub first_name: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping cart (book id -> quantity map).
    pub const CART: &str = "cart";

    /// Key for one-shot flash messages.
    pub const FLASH: &str = "_flash";
}
