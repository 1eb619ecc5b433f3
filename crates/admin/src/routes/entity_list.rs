//! Generic entity list rendering.
//!
//! One template renders every entity's list page; handlers reduce their
//! rows to cells and pair them with the entity's declarative metadata.

use askama::Template;
use askama_web::WebTemplate;

use crate::components::entity_admin::{EntityAdmin, FilterType, TableColumn};

use super::PageContext;

/// One rendered row: the record id plus one cell per column.
#[derive(Clone)]
pub struct RowView {
    pub id: i32,
    pub cells: Vec<String>,
}

/// A filter control with its current value resolved.
#[derive(Clone)]
pub struct FilterView {
    pub key: String,
    pub label: String,
    pub is_select: bool,
    /// Current value for text filters.
    pub value: String,
    /// Options for select filters.
    pub options: Vec<FilterOptionView>,
}

/// A select-filter option with its selection state resolved.
#[derive(Clone)]
pub struct FilterOptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl FilterView {
    /// Resolve the entity's filter definitions against current values.
    ///
    /// `current` maps filter key to the submitted value.
    #[must_use]
    pub fn resolve(entity: &EntityAdmin, current: &[(&str, String)]) -> Vec<Self> {
        entity
            .filters
            .iter()
            .map(|filter| {
                let value = current
                    .iter()
                    .find(|(key, _)| *key == filter.key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                Self {
                    key: filter.key.clone(),
                    label: filter.label.clone(),
                    is_select: matches!(filter.filter_type, FilterType::Select),
                    options: filter
                        .options
                        .iter()
                        .map(|o| FilterOptionView {
                            value: o.value.clone(),
                            label: o.label.clone(),
                            selected: o.value == value,
                        })
                        .collect(),
                    value,
                }
            })
            .collect()
    }
}

/// Generic entity list page template.
#[derive(Template, WebTemplate)]
#[template(path = "entity/list.html")]
pub struct EntityListTemplate {
    pub ctx: PageContext,
    /// Plural heading, e.g. "Books".
    pub title: String,
    /// Base path, e.g. "/books".
    pub base: String,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<FilterView>,
    pub rows: Vec<RowView>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    /// Query string (minus page) to preserve across pagination links.
    pub preserve_params: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entity_admin::{ActionPermissions, FilterOption, TableFilter};

    #[test]
    fn test_filter_resolution_marks_selected_option() {
        let entity = EntityAdmin {
            slug: "orders",
            singular: "Order",
            plural: "Orders",
            columns: vec![],
            filters: vec![TableFilter::select(
                "status",
                "Status",
                vec![
                    FilterOption::new("pending", "Pending"),
                    FilterOption::new("shipped", "Shipped"),
                ],
            )],
            permissions: ActionPermissions::agent_managed(),
        };

        let views = FilterView::resolve(&entity, &[("status", "shipped".to_string())]);
        assert_eq!(views.len(), 1);
        assert!(views[0].is_select);
        assert!(!views[0].options[0].selected);
        assert!(views[0].options[1].selected);
    }

    #[test]
    fn test_filter_resolution_defaults_to_empty() {
        let entity = EntityAdmin {
            slug: "authors",
            singular: "Author",
            plural: "Authors",
            columns: vec![],
            filters: vec![TableFilter::text("search", "Name")],
            permissions: ActionPermissions::agent_managed(),
        };

        let views = FilterView::resolve(&entity, &[]);
        assert_eq!(views[0].value, "");
        assert!(!views[0].is_select);
    }
}
