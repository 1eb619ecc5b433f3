//! Category administration handlers.

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

use mybookstore_core::CategoryId;

use crate::components::entity_admin::{
    Action, ActionPermissions, EntityAdmin, TableColumn, TableFilter,
};
use crate::db::categories::{CategoryAdminRepository, CategoryInput};
use crate::db::{ADMIN_PAGE_SIZE, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAgent};
use crate::models::flash;
use crate::state::AppState;

use super::entity_list::{EntityListTemplate, FilterView, RowView};
use super::{ListQuery, PageContext};

/// Declarative surface for the category entity.
#[must_use]
pub fn categories_admin() -> EntityAdmin {
    EntityAdmin {
        slug: "categories",
        singular: "Category",
        plural: "Categories",
        columns: vec![
            TableColumn::sortable("id", "ID"),
            TableColumn::sortable("name", "Name"),
            TableColumn::new("books", "Books"),
        ],
        filters: vec![TableFilter::text("search", "Name")],
        permissions: ActionPermissions::agent_managed(),
    }
}

/// Category form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryForm {
    fn into_input(self) -> CategoryInput {
        CategoryInput {
            name: self.name.trim().to_owned(),
            description: self.description.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Category create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub name: String,
    pub description: String,
}

/// Display the category list.
#[instrument(skip(state, session, admin))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let entity = categories_admin();
    let page = CategoryAdminRepository::new(state.pool())
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
        ctx: PageContext::build(&session, &admin, "categories").await,
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
    Ok(CategoryFormTemplate {
        ctx: PageContext::build(&session, &admin, "categories").await,
        heading: "New category".to_string(),
        action: "/categories".to_string(),
        name: String::new(),
        description: String::new(),
    })
}

/// Handle the create form.
#[instrument(skip(state, session, _admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(_admin): RequireAgent,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let input = form.into_input();
    CategoryAdminRepository::new(state.pool())
        .create(&input)
        .await?;
    flash::success(&session, format!("Category \"{}\" created.", input.name)).await;
    Ok(Redirect::to("/categories").into_response())
}

/// Display the edit form.
#[instrument(skip(state, session, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Path(id): Path<i32>,
) -> Result<Response> {
    let category = match CategoryAdminRepository::new(state.pool())
        .get(CategoryId::new(id))
        .await
    {
        Ok(category) => category,
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(format!("category {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(CategoryFormTemplate {
        ctx: PageContext::build(&session, &admin, "categories").await,
        heading: format!("Edit {}", category.name),
        action: format!("/categories/{id}"),
        name: category.name,
        description: category.description.unwrap_or_default(),
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
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    CategoryAdminRepository::new(state.pool())
        .update(CategoryId::new(id), &form.into_input())
        .await?;
    flash::success(&session, "Category updated.").await;
    Ok(Redirect::to("/categories").into_response())
}

/// Delete a category. Requires the admin role.
#[instrument(skip(state, session, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    CategoryAdminRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await?;
    flash::success(&session, "Category deleted.").await;
    Ok(Redirect::to("/categories").into_response())
}
