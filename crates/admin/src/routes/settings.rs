//! Settings handlers: key-value configuration, admin-only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::settings;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::flash;
use crate::state::AppState;

use super::PageContext;

/// Settings form data.
#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub stock_alert_threshold: String,
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub ctx: PageContext,
    pub stock_alert_threshold: i32,
    pub error: Option<String>,
}

/// Display the settings page.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let threshold = settings::stock_alert_threshold(state.pool()).await?;

    Ok(SettingsTemplate {
        ctx: PageContext::build(&session, &admin, "settings").await,
        stock_alert_threshold: threshold,
        error: None,
    })
}

/// Save the settings.
#[instrument(skip(state, session, admin, form))]
pub async fn save(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let Ok(threshold) = form.stock_alert_threshold.trim().parse::<i32>() else {
        let current = settings::stock_alert_threshold(state.pool()).await?;
        return Ok(SettingsTemplate {
            ctx: PageContext::build(&session, &admin, "settings").await,
            stock_alert_threshold: current,
            error: Some("The threshold must be a whole number.".to_string()),
        }
        .into_response());
    };

    if threshold < 0 {
        let current = settings::stock_alert_threshold(state.pool()).await?;
        return Ok(SettingsTemplate {
            ctx: PageContext::build(&session, &admin, "settings").await,
            stock_alert_threshold: current,
            error: Some("The threshold cannot be negative.".to_string()),
        }
        .into_response());
    }

    settings::set_setting(
        state.pool(),
        settings::STOCK_ALERT_THRESHOLD_KEY,
        &threshold.to_string(),
    )
    .await?;

    flash::success(&session, "Settings saved.").await;
    Ok(Redirect::to("/settings").into_response())
}
