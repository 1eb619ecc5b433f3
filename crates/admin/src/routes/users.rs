//! User administration handlers.
//!
//! User management is admin-only throughout. Creating a user without a
//! password generates a temporary one shown exactly once in the flash
//! message; edits optionally rotate the password, and a dedicated action
//! resets it to a fresh temporary value.

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

use mybookstore_core::{CustomerId, Role};

use crate::components::entity_admin::{
    Action, ActionPermissions, EntityAdmin, TableColumn, TableFilter,
};
use crate::db::users::{UserAdminRepository, UserInput, UserRow};
use crate::db::{ADMIN_PAGE_SIZE, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::flash;
use crate::services::auth::{generate_temporary_password, hash_password};
use crate::state::AppState;

use super::entity_list::{EntityListTemplate, FilterView, RowView};
use super::{ListQuery, PageContext};

/// Declarative surface for the user entity.
#[must_use]
pub fn users_admin() -> EntityAdmin {
    EntityAdmin {
        slug: "users",
        singular: "User",
        plural: "Users",
        columns: vec![
            TableColumn::sortable("id", "ID"),
            TableColumn::sortable("email", "Email"),
            TableColumn::new("name", "Name"),
            TableColumn::new("role", "Role"),
            TableColumn::new("orders", "Orders"),
            TableColumn::sortable("created_at", "Registered"),
        ],
        filters: vec![TableFilter::text("search", "Email or name")],
        permissions: ActionPermissions::admin_only(),
    }
}

/// User create/edit form data.
#[derive(Debug, Clone, Deserialize)]
pub struct UserForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    /// Blank on create generates a temporary password; blank on edit keeps
    /// the current one.
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl UserForm {
    fn into_input(self) -> std::result::Result<(UserInput, Option<String>), String> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| format!("unknown role: {}", self.role))?;
        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return Err("the email field is required".to_string());
        }

        let password = self
            .password
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());

        Ok((
            UserInput {
                email,
                role,
                first_name: self.first_name.trim().to_owned(),
                last_name: self.last_name.trim().to_owned(),
                phone: self.phone.filter(|s| !s.trim().is_empty()),
                address: self.address.filter(|s| !s.trim().is_empty()),
                city: self.city.filter(|s| !s.trim().is_empty()),
                postal_code: self.postal_code.filter(|s| !s.trim().is_empty()),
            },
            password,
        ))
    }
}

/// A role option for the form select.
#[derive(Clone)]
pub struct RoleOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn role_options(selected: Role, include_subscriber: bool) -> Vec<RoleOptionView> {
    let mut roles = vec![];
    if include_subscriber {
        roles.push(Role::Subscriber);
    }
    roles.push(Role::Agent);
    roles.push(Role::Admin);

    roles
        .into_iter()
        .map(|role| RoleOptionView {
            value: match role {
                Role::Subscriber => "subscriber",
                Role::Agent => "agent",
                Role::Admin => "admin",
            },
            label: role.label(),
            selected: role == selected,
        })
        .collect()
}

/// User create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "users/form.html")]
pub struct UserFormTemplate {
    pub ctx: PageContext,
    pub heading: String,
    pub action: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub roles: Vec<RoleOptionView>,
    /// Help text under the password field differs between create and edit.
    pub password_help: &'static str,
    pub error: Option<String>,
}

/// Display the user list.
#[instrument(skip(state, session, admin))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let entity = users_admin();
    let page = UserAdminRepository::new(state.pool())
        .list(query.search(), query.page(), ADMIN_PAGE_SIZE)
        .await?;

    let rows = page
        .rows
        .iter()
        .map(|row| RowView {
            id: row.id,
            cells: vec![
                row.id.to_string(),
                row.email.clone(),
                format!("{} {}", row.first_name, row.last_name),
                row.role.label().to_string(),
                row.order_count.to_string(),
                row.created_at.format("%Y-%m-%d").to_string(),
            ],
        })
        .collect();

    let current = [("search", query.search().unwrap_or_default().to_string())];
    let preserve_params = query
        .search()
        .map(|s| format!("search={s}"))
        .unwrap_or_default();

    Ok(EntityListTemplate {
        ctx: PageContext::build(&session, &admin, "users").await,
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
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    Ok(UserFormTemplate {
        ctx: PageContext::build(&session, &admin, "users").await,
        heading: "New user".to_string(),
        action: "/users".to_string(),
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        phone: String::new(),
        address: String::new(),
        city: String::new(),
        postal_code: String::new(),
        roles: role_options(Role::Agent, false),
        password_help: "Leave blank to generate a secure temporary password. \
                        It will be shown once after creation.",
        error: None,
    })
}

/// Handle the create form.
#[instrument(skip(state, session, admin, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<UserForm>,
) -> Result<Response> {
    let (input, password) = match form.into_input() {
        Ok(parsed) => parsed,
        Err(message) => {
            return Ok(UserFormTemplate {
                ctx: PageContext::build(&session, &admin, "users").await,
                heading: "New user".to_string(),
                action: "/users".to_string(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                phone: String::new(),
                address: String::new(),
                city: String::new(),
                postal_code: String::new(),
                roles: role_options(Role::Agent, false),
                password_help: "Leave blank to generate a secure temporary password.",
                error: Some(message),
            }
            .into_response());
        }
    };

    // Whether supplied or generated, the password is surfaced exactly once.
    let plain_password = password.unwrap_or_else(generate_temporary_password);
    let hash = hash_password(&plain_password)
        .map_err(|_| AppError::Internal("password hashing failed".to_string()))?;

    match UserAdminRepository::new(state.pool()).create(&input, &hash).await {
        Ok(id) => {
            flash::success(
                &session,
                format!(
                    "User {} created. Temporary password: {plain_password} \
                     - note it now, it will not be shown again.",
                    input.email
                ),
            )
            .await;
            tracing::info!(user_id = %id, role = %input.role, "user created");
            Ok(Redirect::to("/users").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            flash::error(&session, "An account with this email already exists.").await;
            Ok(Redirect::to("/users/new").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn load_user(state: &AppState, id: i32) -> Result<UserRow> {
    match UserAdminRepository::new(state.pool())
        .get(CustomerId::new(id))
        .await
    {
        Ok(user) => Ok(user),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("user {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Display the edit form.
#[instrument(skip(state, session, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    let user = load_user(&state, id).await?;

    Ok(UserFormTemplate {
        ctx: PageContext::build(&session, &admin, "users").await,
        heading: format!("Edit {}", user.email),
        action: format!("/users/{id}"),
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        phone: user.phone.unwrap_or_default(),
        address: user.address.unwrap_or_default(),
        city: user.city.unwrap_or_default(),
        postal_code: user.postal_code.unwrap_or_default(),
        roles: role_options(user.role, true),
        password_help: "Leave blank to keep the current password.",
        error: None,
    }
    .into_response())
}

/// Handle the edit form.
#[instrument(skip(state, session, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<UserForm>,
) -> Result<Response> {
    let (input, password) = form
        .into_input()
        .map_err(AppError::BadRequest)?;

    let new_hash = password
        .map(|p| hash_password(&p))
        .transpose()
        .map_err(|_| AppError::Internal("password hashing failed".to_string()))?;

    UserAdminRepository::new(state.pool())
        .update(CustomerId::new(id), &input, new_hash.as_deref())
        .await?;

    let message = if new_hash.is_some() {
        format!("User {} updated. The password has been changed.", input.email)
    } else {
        format!("User {} updated.", input.email)
    };
    flash::success(&session, message).await;
    Ok(Redirect::to("/users").into_response())
}

/// Generate and apply a fresh temporary password.
#[instrument(skip(state, session, _admin))]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    let user = load_user(&state, id).await?;

    let plain_password = generate_temporary_password();
    let hash = hash_password(&plain_password)
        .map_err(|_| AppError::Internal("password hashing failed".to_string()))?;

    UserAdminRepository::new(state.pool())
        .update_password(CustomerId::new(id), &hash)
        .await?;

    flash::success(
        &session,
        format!(
            "Password for {} reset. New temporary password: {plain_password} \
             - note it now, it will not be shown again.",
            user.email
        ),
    )
    .await;
    tracing::info!(user_id = id, "admin reset a user password");
    Ok(Redirect::to("/users").into_response())
}

/// Delete a user.
#[instrument(skip(state, session, admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    if admin.id.as_i32() == id {
        flash::error(&session, "You cannot delete your own account.").await;
        return Ok(Redirect::to("/users").into_response());
    }

    match UserAdminRepository::new(state.pool())
        .delete(CustomerId::new(id))
        .await
    {
        Ok(()) => {
            flash::success(&session, "User deleted.").await;
        }
        Err(RepositoryError::InUse(_)) => {
            flash::error(&session, "This user has orders and cannot be deleted.").await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/users").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> UserForm {
        UserForm {
            email: " Agent@Example.COM ".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            role: "agent".to_string(),
            password: None,
            phone: None,
            address: None,
            city: None,
            postal_code: None,
        }
    }

    #[test]
    fn test_user_form_normalizes_email() {
        let (input, password) = form().into_input().expect("valid form");
        assert_eq!(input.email, "agent@example.com");
        assert_eq!(input.role, Role::Agent);
        assert!(password.is_none());
    }

    #[test]
    fn test_user_form_blank_password_is_none() {
        let mut f = form();
        f.password = Some("   ".to_string());
        let (_, password) = f.into_input().expect("valid form");
        assert!(password.is_none());
    }

    #[test]
    fn test_user_form_rejects_unknown_role() {
        let mut f = form();
        f.role = "manager".to_string();
        assert!(f.into_input().is_err());
    }

    #[test]
    fn test_role_options_marks_selected() {
        let options = role_options(Role::Admin, true);
        assert_eq!(options.len(), 3);
        assert!(options.iter().any(|o| o.value == "admin" && o.selected));
        assert!(!options.iter().any(|o| o.value == "agent" && o.selected));
    }
}
