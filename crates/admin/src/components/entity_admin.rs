//! Declarative entity surface metadata.
//!
//! Each managed entity describes its list columns, filters and the minimum
//! role per action as plain data; the generic list template and the route
//! handlers interpret it. Adding a column or changing a permission is a
//! one-line edit here, not a template change.

use serde::{Deserialize, Serialize};

use mybookstore_core::Role;

/// Column definition for an entity list page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column (matches the sort parameter).
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Whether the column is sortable.
    pub sortable: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: false,
        }
    }
}

/// Filter type for entity list pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Text input filter.
    Text,
    /// Single-select dropdown.
    Select,
    /// Number range (min/max).
    NumberRange,
}

/// Filter definition for an entity list page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Filter parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Available options (for select filters).
    pub options: Vec<FilterOption>,
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            options: vec![],
        }
    }

    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            options,
        }
    }
}

/// Actions an entity surface exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Detail,
    Create,
    Edit,
    Delete,
}

/// Minimum role required per action.
#[derive(Debug, Clone, Copy)]
pub struct ActionPermissions {
    pub list: Role,
    pub detail: Role,
    pub create: Role,
    pub edit: Role,
    pub delete: Role,
}

impl ActionPermissions {
    /// Catalogue default: agents manage records, only admins delete.
    #[must_use]
    pub const fn agent_managed() -> Self {
        Self {
            list: Role::Agent,
            detail: Role::Agent,
            create: Role::Agent,
            edit: Role::Agent,
            delete: Role::Admin,
        }
    }

    /// Admin-only surface (user management).
    #[must_use]
    pub const fn admin_only() -> Self {
        Self {
            list: Role::Admin,
            detail: Role::Admin,
            create: Role::Admin,
            edit: Role::Admin,
            delete: Role::Admin,
        }
    }

    const fn required(self, action: Action) -> Role {
        match action {
            Action::List => self.list,
            Action::Detail => self.detail,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }
}

/// Declarative description of one managed entity.
#[derive(Debug, Clone)]
pub struct EntityAdmin {
    /// URL path segment, e.g. `books`.
    pub slug: &'static str,
    /// Singular label, e.g. `Book`.
    pub singular: &'static str,
    /// Plural label, e.g. `Books`.
    pub plural: &'static str,
    /// List page columns.
    pub columns: Vec<TableColumn>,
    /// List page filters.
    pub filters: Vec<TableFilter>,
    /// Role requirements per action.
    pub permissions: ActionPermissions,
}

impl EntityAdmin {
    /// Whether `role` may perform `action` on this entity.
    #[must_use]
    pub fn allows(&self, role: Role, action: Action) -> bool {
        role.allows(self.permissions.required(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(permissions: ActionPermissions) -> EntityAdmin {
        EntityAdmin {
            slug: "books",
            singular: "Book",
            plural: "Books",
            columns: vec![TableColumn::sortable("title", "Title")],
            filters: vec![],
            permissions,
        }
    }

    #[test]
    fn test_agent_managed_permissions() {
        let books = entity(ActionPermissions::agent_managed());
        assert!(books.allows(Role::Agent, Action::List));
        assert!(books.allows(Role::Agent, Action::Create));
        assert!(books.allows(Role::Agent, Action::Edit));
        // delete requires the highest role
        assert!(!books.allows(Role::Agent, Action::Delete));
        assert!(books.allows(Role::Admin, Action::Delete));
        // subscribers never reach any action
        assert!(!books.allows(Role::Subscriber, Action::List));
    }

    #[test]
    fn test_admin_only_permissions() {
        let users = entity(ActionPermissions::admin_only());
        assert!(!users.allows(Role::Agent, Action::List));
        assert!(users.allows(Role::Admin, Action::Edit));
    }
}
