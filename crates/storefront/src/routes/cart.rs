//! Cart route handlers.
//!
//! The cart itself is a session-stored map (`models::cart`); these handlers
//! validate against live stock before mutating it and redirect back with a
//! flash message, mirroring classic POST/redirect/GET form flows.

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

use rust_decimal::Decimal;

use mybookstore_core::{BookId, format_eur};

use crate::db::RepositoryError;
use crate::db::books::BookRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::flash;
use crate::services::cart::{self, CartLine, CartService};
use crate::state::AppState;

use super::PageContext;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub book_id: i32,
    pub title: String,
    pub authors: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub stock: i32,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            book_id: line.book.id.as_i32(),
            title: line.book.title.clone(),
            authors: line.book.author_names(),
            quantity: line.quantity,
            unit_price: format_eur(line.book.price),
            line_total: format_eur(line.line_total()),
            stock: line.book.stock,
        }
    }
}

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub quantity: Option<u32>,
}

/// Quantity-update form data. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub quantity: i64,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/index.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
}

/// Display the cart page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let cart = cart::load_cart(&session).await;
    let service = CartService::new(state.pool());
    let lines = service.lines(&cart).await?;
    let total = cart::cart_total(&lines);

    Ok(CartTemplate {
        ctx: PageContext::build(&session, Some(&user)).await,
        lines: lines.iter().map(CartLineView::from).collect(),
        total,
    })
}

/// Add a book to the cart.
///
/// Validates that the book exists, is in stock, and that the cart quantity
/// plus the requested quantity still fits the current stock.
#[instrument(skip(state, session, _user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireUser(_user): RequireUser,
    Path(id): Path<i32>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let book_id = BookId::new(id);
    let books = BookRepository::new(state.pool());

    let book = match books.find_by_id(book_id).await {
        Ok(book) => book,
        Err(RepositoryError::NotFound) => {
            flash::error(&session, "The requested book does not exist.").await;
            return Ok(Redirect::to("/catalogue").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    if book.stock <= 0 {
        flash::error(&session, "This book is out of stock.").await;
        return Ok(Redirect::to(&format!("/catalogue/book/{id}")).into_response());
    }

    let quantity = form.quantity.unwrap_or(1).max(1);
    let mut cart = cart::load_cart(&session).await;
    let in_cart = cart.quantity_of(book_id);

    if i64::from(in_cart) + i64::from(quantity) > i64::from(book.stock) {
        flash::error(
            &session,
            format!(
                "Insufficient stock. Available: {}, already in cart: {in_cart}.",
                book.stock
            ),
        )
        .await;
        return Ok(Redirect::to(&format!("/catalogue/book/{id}")).into_response());
    }

    cart.add(book_id, quantity);
    cart::store_cart(&session, &cart).await?;

    flash::success(
        &session,
        format!("\"{}\" was added to the cart (quantity: {quantity}).", book.title),
    )
    .await;

    Ok(Redirect::to("/cart").into_response())
}

/// Change the quantity of a book in the cart. Zero removes the line.
#[instrument(skip(state, session, _user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireUser(_user): RequireUser,
    Path(id): Path<i32>,
    Form(form): Form<UpdateQuantityForm>,
) -> Result<Response> {
    let book_id = BookId::new(id);
    let books = BookRepository::new(state.pool());

    let book = match books.find_by_id(book_id).await {
        Ok(book) => book,
        Err(RepositoryError::NotFound) => {
            flash::error(&session, "The requested book does not exist.").await;
            return Ok(Redirect::to("/cart").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    if form.quantity <= 0 {
        let mut cart = cart::load_cart(&session).await;
        cart.remove(book_id);
        cart::store_cart(&session, &cart).await?;
        flash::success(&session, format!("\"{}\" was removed from the cart.", book.title)).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    if form.quantity > i64::from(book.stock) {
        flash::error(
            &session,
            format!(
                "Insufficient stock for \"{}\". Available: {}.",
                book.title, book.stock
            ),
        )
        .await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let quantity = u32::try_from(form.quantity).unwrap_or(u32::MAX);
    let mut cart = cart::load_cart(&session).await;
    cart.set_quantity(book_id, quantity);
    cart::store_cart(&session, &cart).await?;

    flash::success(&session, "Quantity updated.").await;
    Ok(Redirect::to("/cart").into_response())
}

/// Remove a book from the cart.
#[instrument(skip(state, session, _user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireUser(_user): RequireUser,
    Path(id): Path<i32>,
) -> Result<Response> {
    let book_id = BookId::new(id);
    let books = BookRepository::new(state.pool());
    // Removing an entry for a vanished book is still fine.
    let title = books.find_by_id(book_id).await.ok().map(|b| b.title);

    let mut cart = cart::load_cart(&session).await;
    cart.remove(book_id);
    cart::store_cart(&session, &cart).await?;

    if let Some(title) = title {
        flash::success(&session, format!("\"{title}\" was removed from the cart.")).await;
    }

    Ok(Redirect::to("/cart").into_response())
}

/// Empty the cart.
#[instrument(skip(session, _user))]
pub async fn clear(
    session: Session,
    RequireUser(_user): RequireUser,
) -> Result<Response> {
    cart::clear_cart(&session).await?;
    flash::success(&session, "Your cart has been emptied.").await;
    Ok(Redirect::to("/cart").into_response())
}
