//! Profile handlers: details, order history, edits, password change.

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

use mybookstore_core::format_eur;

use crate::db::orders::OrderRepository;
use crate::db::users::CustomerRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::flash;
use crate::models::order::OrderWithLines;
use crate::models::user::{Customer, ProfileUpdate};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

use super::PageContext;

/// Order display data for the history section.
#[derive(Clone)]
pub struct OrderView {
    pub id: i32,
    pub ordered_at: String,
    pub status: &'static str,
    pub total: String,
    pub lines: Vec<OrderLineView>,
}

/// Order line display data.
#[derive(Clone)]
pub struct OrderLineView {
    pub title: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&OrderWithLines> for OrderView {
    fn from(order: &OrderWithLines) -> Self {
        Self {
            id: order.order.id.as_i32(),
            ordered_at: order.order.ordered_at.format("%Y-%m-%d %H:%M").to_string(),
            status: order.order.status.label(),
            total: format_eur(order.order.total_amount),
            lines: order
                .lines
                .iter()
                .map(|line| OrderLineView {
                    title: line.book_title.clone(),
                    quantity: line.quantity,
                    unit_price: format_eur(line.unit_price),
                    line_total: format_eur(line.line_total()),
                })
                .collect(),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub customer: CustomerView,
    pub orders: Vec<OrderView>,
}

/// Customer display data.
#[derive(Clone)]
pub struct CustomerView {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            email: customer.email.to_string(),
            full_name: customer.full_name(),
            phone: customer.phone.clone().unwrap_or_default(),
            address: customer.address.clone().unwrap_or_default(),
            city: customer.city.clone().unwrap_or_default(),
            postal_code: customer.postal_code.clone().unwrap_or_default(),
        }
    }
}

/// Profile edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/edit.html")]
pub struct ProfileEditTemplate {
    pub ctx: PageContext,
    pub customer: CustomerView,
    pub first_name: String,
    pub last_name: String,
}

/// Change-password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/change_password.html")]
pub struct ChangePasswordTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
}

/// Profile edit form data.
#[derive(Debug, Deserialize)]
pub struct ProfileEditForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Change-password form data.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

async fn load_customer(state: &AppState, user: &crate::models::CurrentUser) -> Result<Customer> {
    CustomerRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))
}

/// Display the profile with order history.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let customer = load_customer(&state, &user).await?;
    let orders = OrderRepository::new(state.pool())
        .find_for_customer(customer.id)
        .await?;

    Ok(ProfileTemplate {
        ctx: PageContext::build(&session, Some(&user)).await,
        customer: CustomerView::from(&customer),
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Display the profile edit form.
#[instrument(skip(state, session, user))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let customer = load_customer(&state, &user).await?;

    Ok(ProfileEditTemplate {
        ctx: PageContext::build(&session, Some(&user)).await,
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        customer: CustomerView::from(&customer),
    })
}

/// Apply profile edits.
#[instrument(skip(state, session, user, form))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Form(form): Form<ProfileEditForm>,
) -> Result<Response> {
    let update = ProfileUpdate {
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        phone: form.phone.filter(|s| !s.trim().is_empty()),
        address: form.address.filter(|s| !s.trim().is_empty()),
        city: form.city.filter(|s| !s.trim().is_empty()),
        postal_code: form.postal_code.filter(|s| !s.trim().is_empty()),
    };

    CustomerRepository::new(state.pool())
        .update_profile(user.id, &update)
        .await?;

    flash::success(&session, "Your details have been updated.").await;
    Ok(Redirect::to("/profile").into_response())
}

/// Display the change-password form.
#[instrument(skip(session, user))]
pub async fn change_password_page(
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    Ok(ChangePasswordTemplate {
        ctx: PageContext::build(&session, Some(&user)).await,
        error: None,
    })
}

/// Handle a password change.
#[instrument(skip(state, session, user, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response> {
    let customer = load_customer(&state, &user).await?;
    let service = AuthService::new(state.pool());

    match service
        .change_password(
            &customer,
            &form.current_password,
            &form.new_password,
            &form.new_password_confirm,
        )
        .await
    {
        Ok(()) => {
            flash::success(&session, "Your password has been changed.").await;
            Ok(Redirect::to("/profile").into_response())
        }
        Err(e @ (AuthError::WrongCurrentPassword
        | AuthError::WeakPassword(_)
        | AuthError::PasswordMismatch)) => Ok(ChangePasswordTemplate {
            ctx: PageContext::build(&session, Some(&user)).await,
            error: Some(e.to_string()),
        }
        .into_response()),
        Err(e) => Err(AppError::Auth(e)),
    }
}
