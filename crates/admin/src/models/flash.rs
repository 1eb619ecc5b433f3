//! One-shot flash messages carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session_keys;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    /// CSS class suffix used by the templates.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

/// Queue a success message for the next page view.
pub async fn success(session: &Session, message: impl Into<String>) {
    push(session, FlashLevel::Success, message.into()).await;
}

/// Queue an error message for the next page view.
pub async fn error(session: &Session, message: impl Into<String>) {
    push(session, FlashLevel::Error, message.into()).await;
}

async fn push(session: &Session, level: FlashLevel, message: String) {
    let mut pending: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(Flash { level, message });
    if let Err(e) = session.insert(session_keys::FLASH, pending).await {
        tracing::warn!("failed to store flash message: {e}");
    }
}

/// Drain all pending flash messages for rendering.
pub async fn take(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("failed to read flash messages: {e}");
            Vec::new()
        }
    }
}
