//! Order administration handlers: list, detail, status transitions.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mybookstore_core::{OrderId, OrderStatus, format_eur};

use crate::components::entity_admin::{
    Action, ActionPermissions, EntityAdmin, FilterOption, TableColumn, TableFilter,
};
use crate::db::orders::OrderAdminRepository;
use crate::db::{ADMIN_PAGE_SIZE, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAgent;
use crate::models::flash;
use crate::state::AppState;

use super::entity_list::{EntityListTemplate, FilterView, RowView};
use super::PageContext;

/// Declarative surface for the order entity.
///
/// Orders are never created or deleted from the back office; only their
/// status changes, so create/edit/delete are pinned above any real role.
#[must_use]
pub fn orders_admin() -> EntityAdmin {
    EntityAdmin {
        slug: "orders",
        singular: "Order",
        plural: "Orders",
        columns: vec![
            TableColumn::sortable("id", "ID"),
            TableColumn::new("customer", "Customer"),
            TableColumn::sortable("ordered_at", "Date"),
            TableColumn::new("status", "Status"),
            TableColumn::new("lines", "Lines"),
            TableColumn::sortable("total", "Total"),
        ],
        filters: vec![TableFilter::select(
            "status",
            "Status",
            OrderStatus::ALL
                .iter()
                .map(|s| FilterOption::new(&s.to_string(), s.label()))
                .collect(),
        )],
        permissions: ActionPermissions {
            list: mybookstore_core::Role::Agent,
            detail: mybookstore_core::Role::Agent,
            // Checkout is the only writer; these actions do not exist here.
            create: mybookstore_core::Role::Admin,
            edit: mybookstore_core::Role::Agent,
            delete: mybookstore_core::Role::Admin,
        },
    }
}

/// Order list query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

/// Status transition form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Order line display data.
#[derive(Clone)]
pub struct OrderLineView {
    pub book_id: i32,
    pub title: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

/// A status option for the transition select.
#[derive(Clone)]
pub struct StatusOptionView {
    pub value: String,
    pub label: &'static str,
    pub selected: bool,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub ctx: PageContext,
    pub id: i32,
    pub customer_email: String,
    pub customer_name: String,
    pub ordered_at: String,
    pub status: &'static str,
    pub statuses: Vec<StatusOptionView>,
    pub total: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub lines: Vec<OrderLineView>,
}

/// Display the order list.
#[instrument(skip(state, session, admin))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse> {
    let entity = orders_admin();
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<OrderStatus>().ok());
    let page_number = query.page.unwrap_or(1).max(1);

    let page = OrderAdminRepository::new(state.pool())
        .list(status, page_number, ADMIN_PAGE_SIZE)
        .await?;

    let rows = page
        .rows
        .iter()
        .map(|row| RowView {
            id: row.id,
            cells: vec![
                row.id.to_string(),
                row.customer_email.clone(),
                row.ordered_at.format("%Y-%m-%d %H:%M").to_string(),
                row.status.label().to_string(),
                row.line_count.to_string(),
                format_eur(row.total_amount),
            ],
        })
        .collect();

    let current = [(
        "status",
        status.map(|s| s.to_string()).unwrap_or_default(),
    )];
    let preserve_params = status
        .map(|s| format!("status={s}"))
        .unwrap_or_default();

    Ok(EntityListTemplate {
        ctx: PageContext::build(&session, &admin, "orders").await,
        title: entity.plural.to_string(),
        base: format!("/{}", entity.slug),
        filters: FilterView::resolve(&entity, &current),
        columns: entity.columns.clone(),
        rows,
        total: page.total,
        page: page_number,
        total_pages: page.total_pages,
        can_create: false,
        // "edit" on an order means opening the detail page with its
        // status form
        can_edit: entity.allows(admin.role, Action::Edit),
        can_delete: false,
        preserve_params,
    })
}

/// Display one order.
#[instrument(skip(state, session, admin))]
pub async fn detail(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Path(id): Path<i32>,
) -> Result<Response> {
    let (order, lines) = match OrderAdminRepository::new(state.pool())
        .get(OrderId::new(id))
        .await
    {
        Ok(found) => found,
        Err(RepositoryError::NotFound) => return Err(AppError::NotFound(format!("order {id}"))),
        Err(e) => return Err(e.into()),
    };

    let statuses = OrderStatus::ALL
        .iter()
        .map(|s| StatusOptionView {
            value: s.to_string(),
            label: s.label(),
            selected: *s == order.status,
        })
        .collect();

    Ok(OrderDetailTemplate {
        ctx: PageContext::build(&session, &admin, "orders").await,
        id: order.id,
        customer_email: order.customer_email,
        customer_name: order.customer_name,
        ordered_at: order.ordered_at.format("%Y-%m-%d %H:%M").to_string(),
        status: order.status.label(),
        statuses,
        total: format_eur(order.total_amount),
        shipping_address: order.shipping_address.unwrap_or_default(),
        shipping_city: order.shipping_city.unwrap_or_default(),
        shipping_postal_code: order.shipping_postal_code.unwrap_or_default(),
        lines: lines
            .into_iter()
            .map(|line| OrderLineView {
                book_id: line.book_id,
                title: line.book_title,
                quantity: line.quantity,
                unit_price: format_eur(line.unit_price),
                line_total: format_eur(
                    line.unit_price * rust_decimal::Decimal::from(line.quantity),
                ),
            })
            .collect(),
    }
    .into_response())
}

/// Apply a status transition.
#[instrument(skip(state, session, _admin, form))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(_admin): RequireAgent,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let Ok(status) = form.status.parse::<OrderStatus>() else {
        return Err(AppError::BadRequest(format!(
            "unknown order status: {}",
            form.status
        )));
    };

    OrderAdminRepository::new(state.pool())
        .update_status(OrderId::new(id), status)
        .await?;

    flash::success(
        &session,
        format!("Order #{id} marked as {}.", status.label()),
    )
    .await;
    tracing::info!(order_id = id, status = %status, "order status changed");
    Ok(Redirect::to(&format!("/orders/{id}")).into_response())
}
