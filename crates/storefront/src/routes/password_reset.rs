//! Password-reset request and confirmation handlers.
//!
//! The request endpoint renders the same confirmation whether or not the
//! email matched an account, so it cannot be used to probe for registered
//! addresses.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::models::flash;
use crate::services::password_reset::{PasswordResetService, ResetError};
use crate::state::AppState;

use super::PageContext;

/// Reset-request form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// New-password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub password_confirm: String,
}

/// Reset-request page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub ctx: PageContext,
    pub email_sent: bool,
    pub error: Option<String>,
}

/// New-password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub ctx: PageContext,
    pub token: String,
    pub error: Option<String>,
}

/// Display the reset-request form. Logged-in users are sent home.
#[instrument(skip(session, user))]
pub async fn forgot_password_page(
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(ForgotPasswordTemplate {
        ctx: PageContext::build(&session, None).await,
        email_sent: false,
        error: None,
    }
    .into_response())
}

/// Handle a reset request. Always reports success.
#[instrument(skip(state, session, form))]
pub async fn request_reset(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response> {
    if form.email.trim().is_empty() {
        return Ok(ForgotPasswordTemplate {
            ctx: PageContext::build(&session, None).await,
            email_sent: false,
            error: Some("Please enter your email address.".to_string()),
        }
        .into_response());
    }

    let service = PasswordResetService::new(
        state.pool(),
        state.mailer(),
        &state.config().base_url,
    );
    service.request(form.email.trim()).await?;

    Ok(ForgotPasswordTemplate {
        ctx: PageContext::build(&session, None).await,
        email_sent: true,
        error: None,
    }
    .into_response())
}

/// Display the new-password form if the token is valid.
#[instrument(skip(state, session, user))]
pub async fn reset_page(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Path(token): Path<String>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let service = PasswordResetService::new(
        state.pool(),
        state.mailer(),
        &state.config().base_url,
    );

    match service.verify_token(&token).await {
        Ok(()) => Ok(ResetPasswordTemplate {
            ctx: PageContext::build(&session, None).await,
            token,
            error: None,
        }
        .into_response()),
        Err(ResetError::InvalidToken) => {
            flash::error(&session, "This reset link is invalid or has expired.").await;
            Ok(Redirect::to("/forgot-password").into_response())
        }
        Err(ResetError::Repository(e)) => Err(AppError::Database(e)),
        Err(_) => Err(AppError::Internal("unexpected reset error".to_string())),
    }
}

/// Consume the token and set the new password.
#[instrument(skip(state, session, form))]
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    let service = PasswordResetService::new(
        state.pool(),
        state.mailer(),
        &state.config().base_url,
    );

    match service
        .reset(&token, &form.password, &form.password_confirm)
        .await
    {
        Ok(()) => {
            flash::success(
                &session,
                "Your password has been reset. You can now log in.",
            )
            .await;
            Ok(Redirect::to("/login").into_response())
        }
        Err(ResetError::InvalidToken) => {
            flash::error(&session, "This reset link is invalid or has expired.").await;
            Ok(Redirect::to("/forgot-password").into_response())
        }
        Err(e @ (ResetError::WeakPassword(_) | ResetError::PasswordMismatch)) => {
            Ok(ResetPasswordTemplate {
                ctx: PageContext::build(&session, None).await,
                token,
                error: Some(e.to_string()),
            }
            .into_response())
        }
        Err(ResetError::Repository(e)) => Err(AppError::Database(e)),
    }
}
