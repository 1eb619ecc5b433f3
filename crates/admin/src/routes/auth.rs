//! Admin login and logout handlers.

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

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_session, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::auth::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

use mybookstore_core::Email;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template. Standalone, not based on the admin chrome.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub last_email: String,
}

/// Display the login page.
#[instrument]
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        error: None,
        last_email: String::new(),
    }
}

/// Handle an admin login attempt.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let service = AdminAuthService::new(state.pool());

    match service.login(&form.email, &form.password).await {
        Ok(user) => {
            let email = Email::parse(&user.email)
                .map_err(|e| AppError::Internal(format!("invalid email in database: {e}")))?;
            session.cycle_id().await?;
            set_current_admin(
                &session,
                &CurrentAdmin {
                    id: mybookstore_core::CustomerId::new(user.id),
                    email,
                    role: user.role,
                    first_name: user.first_name.clone(),
                },
            )
            .await?;
            tracing::info!(user_id = user.id, role = %user.role, "admin logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(AdminAuthError::InvalidCredentials) => Ok(LoginTemplate {
            error: Some("Invalid email or password.".to_string()),
            last_email: form.email,
        }
        .into_response()),
        Err(AdminAuthError::PasswordHash) => {
            Err(AppError::Internal("password hashing failed".to_string()))
        }
        Err(AdminAuthError::Repository(e)) => Err(AppError::Database(e)),
    }
}

/// Log out of the admin panel.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response> {
    clear_session(&session).await?;
    Ok(Redirect::to("/login").into_response())
}
