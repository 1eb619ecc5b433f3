//! Publisher administration handlers.

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

use mybookstore_core::PublisherId;

use crate::components::entity_admin::{
    Action, ActionPermissions, EntityAdmin, TableColumn, TableFilter,
};
use crate::db::publishers::{PublisherAdminRepository, PublisherInput};
use crate::db::{ADMIN_PAGE_SIZE, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAgent};
use crate::models::flash;
use crate::state::AppState;

use super::entity_list::{EntityListTemplate, FilterView, RowView};
use super::{ListQuery, PageContext};

/// Declarative surface for the publisher entity.
#[must_use]
pub fn publishers_admin() -> EntityAdmin {
    EntityAdmin {
        slug: "publishers",
        singular: "Publisher",
        plural: "Publishers",
        columns: vec![
            TableColumn::sortable("id", "ID"),
            TableColumn::sortable("name", "Name"),
            TableColumn::new("phone", "Phone"),
            TableColumn::new("books", "Books"),
        ],
        filters: vec![TableFilter::text("search", "Name")],
        permissions: ActionPermissions::agent_managed(),
    }
}

/// Publisher form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherForm {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl PublisherForm {
    fn into_input(self) -> PublisherInput {
        PublisherInput {
            name: self.name.trim().to_owned(),
            address: self.address.filter(|s| !s.trim().is_empty()),
            phone: self.phone.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Publisher create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "publishers/form.html")]
pub struct PublisherFormTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Display the publisher list.
#[instrument(skip(state, session, admin))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let entity = publishers_admin();
    let page = PublisherAdminRepository::new(state.pool())
        .list(query.search(), query.page(), ADMIN_PAGE_SIZE)
        .await?;

    let rows = page
        .rows
        .iter()
        .map(|row| RowView {
            id: row.id,
            cells: vec![
                row.id.to_string(),
                row.name.clone(),
                row.phone.clone().unwrap_or_default(),
                row.book_count.to_string(),
            ],
        })
        .collect();

    let current = [("search", query.search().unwrap_or_default().to_string())];
    let preserve_params = query
        .search()
        .map(|s| format!("search={s}"))
        .unwrap_or_default();

    Ok(EntityListTemplate {
        ctx: PageContext::build(&session, &admin, "publishers").await,
        title: entity.plural.to_string(),
        base: format!("/{}", entity.slug),
        filters: FilterView::resolve(&entity, &current),
        columns: entity.columns.clone(),
        rows,
        total: page.total,
        page: query.page(),
        total_pages: page.total_pages,
        can_create: entity.allows(admin.role, Action::Create),
        can_edit: entity.allows(admin.role, Action::Edit),
        can_delete: entity.allows(admin.role, Action::Delete),
        preserve_params,
    })
}

/// Display the create form.
#[instrument(skip(session, admin))]
pub async fn new_page(
    session: Session,
    RequireAgent(admin): RequireAgent,
) -> Result<impl IntoResponse> {
    Ok(PublisherFormTemplate {
        ctx: PageContext::build(&session, &admin, "publishers").await,
        heading: "New publisher".to_string(),
        action: "/publishers".to_string(),
        name: String::new(),
        address: String::new(),
        phone: String::new(),
    })
}

/// Handle the create form.
#[instrument(skip(state, session, _admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(_admin): RequireAgent,
    Form(form): Form<PublisherForm>,
) -> Result<Response> {
    let input = form.into_input();
    PublisherAdminRepository::new(state.pool())
        .create(&input)
        .await?;
    flash::success(&session, format!("Publisher \"{}\" created.", input.name)).await;
    Ok(Redirect::to("/publishers").into_response())
}

/// Display the edit form.
#[instrument(skip(state, session, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Path(id): Path<i32>,
) -> Result<Response> {
    let publisher = match PublisherAdminRepository::new(state.pool())
        .get(PublisherId::new(id))
        .await
    {
        Ok(publisher) => publisher,
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(format!("publisher {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(PublisherFormTemplate {
        ctx: PageContext::build(&session, &admin, "publishers").await,
        heading: format!("Edit {}", publisher.name),
        action: format!("/publishers/{id}"),
        name: publisher.name,
        address: publisher.address.unwrap_or_default(),
        phone: publisher.phone.unwrap_or_default(),
    }
    .into_response())
}

/// Handle the edit form.
#[instrument(skip(state, session, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(_admin): RequireAgent,
    Path(id): Path<i32>,
    Form(form): Form<PublisherForm>,
) -> Result<Response> {
    PublisherAdminRepository::new(state.pool())
        .update(PublisherId::new(id), &form.into_input())
        .await?;
    flash::success(&session, "Publisher updated.").await;
    Ok(Redirect::to("/publishers").into_response())
}

/// Delete a publisher. Requires the admin role.
#[instrument(skip(state, session, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    match PublisherAdminRepository::new(state.pool())
        .delete(PublisherId::new(id))
        .await
    {
        Ok(()) => {
            flash::success(&session, "Publisher deleted.").await;
        }
        Err(RepositoryError::InUse(_)) => {
            flash::error(
                &session,
                "This publisher still has books and cannot be deleted.",
            )
            .await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/publishers").into_response())
}
