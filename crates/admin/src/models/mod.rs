//! Session types for the admin panel.

pub mod flash;

pub use flash::{Flash, FlashLevel};

use serde::{Deserialize, Serialize};

use mybookstore_core::{CustomerId, Email, Role};

/// Session-stored admin identity.
///
/// Only accounts with the agent or admin role ever reach the session here;
/// the login handler rejects subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Account's database ID.
    pub id: CustomerId,
    /// Account's email address.
    pub email: Email,
    /// Role at login time.
    pub role: Role,
    /// Display name for the header.
    pub first_name: String,
}

/// Session keys.
pub mod session_keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for one-shot flash messages.
    pub const FLASH: &str = "_flash";
}
