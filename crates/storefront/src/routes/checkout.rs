//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use rust_decimal::Decimal;

use mybookstore_core::format_eur;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::flash;
use crate::services::cart::{self, CartService};
use crate::services::checkout::{CheckoutError, CheckoutService};
use crate::state::AppState;

use super::PageContext;
use super::cart::CartLineView;

/// Checkout confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirm.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
}

/// Display the order confirmation page.
#[instrument(skip(state, session, user))]
pub async fn confirm_page(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<Response> {
    let cart = cart::load_cart(&session).await;
    if cart.is_empty() {
        flash::error(&session, "Your cart is empty.").await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let service = CartService::new(state.pool());
    let lines = service.lines(&cart).await?;
    let total = cart::cart_total(&lines);

    let customers = crate::db::users::CustomerRepository::new(state.pool());
    let customer = customers
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    Ok(CheckoutTemplate {
        ctx: PageContext::build(&session, Some(&user)).await,
        lines: lines.iter().map(CartLineView::from).collect(),
        total,
        shipping_address: customer.address.unwrap_or_default(),
        shipping_city: customer.city.unwrap_or_default(),
        shipping_postal_code: customer.postal_code.unwrap_or_default(),
    }
    .into_response())
}

/// Place the order: validate stock, write the order atomically, clear the
/// cart, and land on the profile page with a confirmation.
#[instrument(skip(state, session, user))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<Response> {
    let cart = cart::load_cart(&session).await;

    let customers = crate::db::users::CustomerRepository::new(state.pool());
    let customer = customers
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    let checkout = CheckoutService::new(state.pool());
    match checkout.place_order(&customer, &cart).await {
        Ok(placed) => {
            // Only a committed order clears the cart.
            cart::clear_cart(&session).await?;
            flash::success(
                &session,
                format!(
                    "Your order #{} has been placed. Total: {}",
                    placed.id,
                    format_eur(placed.total)
                ),
            )
            .await;
            Ok(Redirect::to("/profile").into_response())
        }
        Err(e @ (CheckoutError::EmptyCart | CheckoutError::InsufficientStock { .. })) => {
            // Recoverable validation errors: back to the cart with the reason.
            flash::error(&session, e.to_string()).await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(CheckoutError::Repository(e)) => Err(AppError::Database(e)),
    }
}
