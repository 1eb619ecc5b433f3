//! Author administration handlers.

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

use mybookstore_core::AuthorId;

use crate::components::entity_admin::{
    Action, ActionPermissions, EntityAdmin, TableColumn, TableFilter,
};
use crate::db::authors::{AuthorAdminRepository, AuthorInput};
use crate::db::{ADMIN_PAGE_SIZE, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAgent};
use crate::models::flash;
use crate::state::AppState;

use super::entity_list::{EntityListTemplate, FilterView, RowView};
use super::{ListQuery, PageContext};

/// Declarative surface for the author entity.
#[must_use]
pub fn authors_admin() -> EntityAdmin {
    EntityAdmin {
        slug: "authors",
        singular: "Author",
        plural: "Authors",
        columns: vec![
            TableColumn::sortable("id", "ID"),
            TableColumn::sortable("name", "Name"),
            TableColumn::new("books", "Books"),
        ],
        filters: vec![TableFilter::text("search", "Name")],
        permissions: ActionPermissions::agent_managed(),
    }
}

/// Author form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorForm {
    pub first_name: String,
    pub last_name: String,
    pub biography: Option<String>,
}

impl AuthorForm {
    fn into_input(self) -> AuthorInput {
        AuthorInput {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            biography: self.biography.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Author create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "authors/form.html")]
pub struct AuthorFormTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
}

/// Display the author list.
#[instrument(skip(state, session, admin))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let entity = authors_admin();
    let page = AuthorAdminRepository::new(state.pool())
        .list(query.search(), query.page(), ADMIN_PAGE_SIZE)
        .await?;

    let rows = page
        .rows
        .iter()
        .map(|row| RowView {
            id: row.id,
            cells: vec![
                row.id.to_string(),
                format!("{} {}", row.first_name, row.last_name),
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
        ctx: PageContext::build(&session, &admin, "authors").await,
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
    Ok(AuthorFormTemplate {
        ctx: PageContext::build(&session, &admin, "authors").await,
        heading: "New author".to_string(),
        action: "/authors".to_string(),
        first_name: String::new(),
        last_name: String::new(),
        biography: String::new(),
    })
}

/// Handle the create form.
#[instrument(skip(state, session, _admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(_admin): RequireAgent,
    Form(form): Form<AuthorForm>,
) -> Result<Response> {
    let input = form.into_input();
    AuthorAdminRepository::new(state.pool()).create(&input).await?;
    flash::success(
        &session,
        format!("Author \"{} {}\" created.", input.first_name, input.last_name),
    )
    .await;
    Ok(Redirect::to("/authors").into_response())
}

/// Display the edit form.
#[instrument(skip(state, session, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Path(id): Path<i32>,
) -> Result<Response> {
    let author = match AuthorAdminRepository::new(state.pool())
        .get(AuthorId::new(id))
        .await
    {
        Ok(author) => author,
        Err(RepositoryError::NotFound) => return Err(AppError::NotFound(format!("author {id}"))),
        Err(e) => return Err(e.into()),
    };

    Ok(AuthorFormTemplate {
        ctx: PageContext::build(&session, &admin, "authors").await,
        heading: format!("Edit {} {}", author.first_name, author.last_name),
        action: format!("/authors/{id}"),
        first_name: author.first_name,
        last_name: author.last_name,
        biography: author.biography.unwrap_or_default(),
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
    Form(form): Form<AuthorForm>,
) -> Result<Response> {
    AuthorAdminRepository::new(state.pool())
        .update(AuthorId::new(id), &form.into_input())
        .await?;
    flash::success(&session, "Author updated.").await;
    Ok(Redirect::to("/authors").into_response())
}

/// Delete an author. Requires the admin role.
#[instrument(skip(state, session, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    AuthorAdminRepository::new(state.pool())
        .delete(AuthorId::new(id))
        .await?;
    flash::success(&session, "Author deleted.").await;
    Ok(Redirect::to("/authors").into_response())
}
