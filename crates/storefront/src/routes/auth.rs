//! Login, logout and registration handlers.

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
use crate::middleware::auth::{clear_session, set_current_user};
use crate::middleware::OptionalUser;
use crate::models::flash;
use crate::models::user::ProfileUpdate;
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

use super::PageContext;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub last_email: String,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub form: RegisterFormView,
}

/// Previously submitted registration values, echoed back on error.
#[derive(Clone, Default)]
pub struct RegisterFormView {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl From<&RegisterForm> for RegisterFormView {
    fn from(form: &RegisterForm) -> Self {
        Self {
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone: form.phone.clone().unwrap_or_default(),
            address: form.address.clone().unwrap_or_default(),
            city: form.city.clone().unwrap_or_default(),
            postal_code: form.postal_code.clone().unwrap_or_default(),
        }
    }
}

/// Normalize an optional form field: blank becomes `None`.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// Display the login page. Logged-in users are sent home.
#[instrument(skip(session, user))]
pub async fn login_page(
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(LoginTemplate {
        ctx: PageContext::build(&session, None).await,
        error: None,
        last_email: String::new(),
    }
    .into_response())
}

/// Handle a login attempt.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let service = AuthService::new(state.pool());

    match service.login(&form.email, &form.password).await {
        Ok(customer) => {
            // Rotate the session id on privilege change.
            session.cycle_id().await?;
            set_current_user(
                &session,
                &CurrentUser {
                    id: customer.id,
                    email: customer.email.clone(),
                    role: customer.role,
                    first_name: customer.first_name.clone(),
                },
            )
            .await?;
            tracing::info!(customer_id = %customer.id, "customer logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok(LoginTemplate {
            ctx: PageContext::build(&session, None).await,
            error: Some("Invalid email or password.".to_string()),
            last_email: form.email,
        }
        .into_response()),
        Err(e) => Err(AppError::Auth(e)),
    }
}

/// Display the registration page. Logged-in users are sent home.
#[instrument(skip(session, user))]
pub async fn register_page(
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(RegisterTemplate {
        ctx: PageContext::build(&session, None).await,
        error: None,
        form: RegisterFormView::default(),
    }
    .into_response())
}

/// Handle a registration, logging the new customer in on success.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let service = AuthService::new(state.pool());

    let profile = ProfileUpdate {
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        phone: non_blank(form.phone.clone()),
        address: non_blank(form.address.clone()),
        city: non_blank(form.city.clone()),
        postal_code: non_blank(form.postal_code.clone()),
    };

    match service
        .register(&form.email, &form.password, &form.password_confirm, &profile)
        .await
    {
        Ok(customer) => {
            session.cycle_id().await?;
            set_current_user(
                &session,
                &CurrentUser {
                    id: customer.id,
                    email: customer.email.clone(),
                    role: customer.role,
                    first_name: customer.first_name.clone(),
                },
            )
            .await?;
            flash::success(&session, "Your account has been created.").await;
            tracing::info!(customer_id = %customer.id, "customer registered");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_facing() => Ok(RegisterTemplate {
            ctx: PageContext::build(&session, None).await,
            error: Some(e.to_string()),
            form: RegisterFormView::from(&form),
        }
        .into_response()),
        Err(e) => Err(AppError::Auth(e)),
    }
}

/// Log out: the whole session is flushed, which also discards the cart.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response> {
    clear_session(&session).await?;
    Ok(Redirect::to("/").into_response())
}
