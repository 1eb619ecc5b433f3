//! Book administration handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mybookstore_core::{BookId, format_eur};

use crate::components::entity_admin::{
    ActionPermissions, EntityAdmin, FilterOption, TableColumn, TableFilter,
};
use crate::db::books::{BookAdminRepository, BookInput, BookListParams};
use crate::db::categories::CategoryAdminRepository;
use crate::db::publishers::PublisherAdminRepository;
use crate::db::authors::AuthorAdminRepository;
use crate::db::{ADMIN_PAGE_SIZE, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAgent};
use crate::models::flash;
use crate::state::AppState;

use super::PageContext;
use super::entity_list::{EntityListTemplate, FilterView, RowView};

/// Declarative surface for the book entity.
pub async fn books_admin(state: &AppState) -> Result<EntityAdmin> {
    let categories = CategoryAdminRepository::new(state.pool()).all().await?;
    let publishers = PublisherAdminRepository::new(state.pool()).all().await?;
    let languages = BookAdminRepository::new(state.pool()).languages().await?;

    Ok(EntityAdmin {
        slug: "books",
        singular: "Book",
        plural: "Books",
        columns: vec![
            TableColumn::sortable("id", "ID"),
            TableColumn::sortable("title", "Title"),
            TableColumn::new("isbn", "ISBN"),
            TableColumn::new("publisher", "Publisher"),
            TableColumn::sortable("price", "Price"),
            TableColumn::sortable("stock", "Stock"),
            TableColumn::new("language", "Language"),
        ],
        filters: vec![
            TableFilter::text("search", "Title or ISBN"),
            TableFilter::select(
                "category",
                "Category",
                categories
                    .iter()
                    .map(|c| FilterOption::new(&c.id.to_string(), &c.name))
                    .collect(),
            ),
            TableFilter::select(
                "publisher",
                "Publisher",
                publishers
                    .iter()
                    .map(|p| FilterOption::new(&p.id.to_string(), &p.name))
                    .collect(),
            ),
            TableFilter::select(
                "language",
                "Language",
                languages
                    .iter()
                    .map(|l| FilterOption::new(l, l))
                    .collect(),
            ),
        ],
        permissions: ActionPermissions::agent_managed(),
    })
}

/// Book list query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub search: Option<String>,
    pub category: Option<i32>,
    pub publisher: Option<i32>,
    pub language: Option<String>,
    pub page: Option<u32>,
}

/// A selectable entry on the book form.
#[derive(Clone)]
pub struct ChoiceView {
    pub id: i32,
    pub label: String,
    pub selected: bool,
}

/// Book create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "books/form.html")]
pub struct BookFormTemplate {
    pub ctx: PageContext,
    pub heading: String,
    /// POST target: `/books` for create, `/books/{id}` for edit.
    pub action: String,
    pub form: BookFormView,
    pub publishers: Vec<ChoiceView>,
    pub authors: Vec<ChoiceView>,
    pub categories: Vec<ChoiceView>,
    pub error: Option<String>,
}

/// Book form field values, pre-rendered for the template.
#[derive(Clone, Default)]
pub struct BookFormView {
    pub title: String,
    pub isbn: String,
    pub page_count: String,
    pub publication_date: String,
    pub price: String,
    pub stock: String,
    pub copies_printed: String,
    pub language: String,
    pub description: String,
    pub cover_image: String,
}

impl From<&BookInput> for BookFormView {
    fn from(input: &BookInput) -> Self {
        Self {
            title: input.title.clone(),
            isbn: input.isbn.clone(),
            page_count: input.page_count.to_string(),
            publication_date: input
                .publication_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            price: input.price.to_string(),
            stock: input.stock.to_string(),
            copies_printed: input.copies_printed.to_string(),
            language: input.language.clone(),
            description: input.description.clone().unwrap_or_default(),
            cover_image: input.cover_image.clone().unwrap_or_default(),
        }
    }
}

/// Parse the book form's key-value pairs.
///
/// The form arrives as a flat pair list because the author and category
/// multi-selects submit repeated keys.
pub fn parse_book_form(pairs: &[(String, String)]) -> std::result::Result<BookInput, String> {
    fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn required(pairs: &[(String, String)], key: &str) -> std::result::Result<String, String> {
        first(pairs, key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| format!("the {} field is required", key.replace('_', " ")))
    }

    fn all_ids(pairs: &[(String, String)], key: &str) -> std::result::Result<Vec<i32>, String> {
        pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| {
                v.parse::<i32>()
                    .map_err(|_| format!("invalid id in {key}: {v}"))
            })
            .collect()
    }

    let title = required(pairs, "title")?;
    let isbn = required(pairs, "isbn")?;
    let language = required(pairs, "language")?;

    let page_count = required(pairs, "page_count")?
        .parse::<i32>()
        .map_err(|_| "page count must be a whole number".to_string())?;
    let price = required(pairs, "price")?
        .parse::<Decimal>()
        .map_err(|_| "price must be a decimal number".to_string())?;
    if price < Decimal::ZERO {
        return Err("price cannot be negative".to_string());
    }
    let stock = required(pairs, "stock")?
        .parse::<i32>()
        .map_err(|_| "stock must be a whole number".to_string())?;
    if stock < 0 {
        return Err("stock cannot be negative".to_string());
    }
    let copies_printed = required(pairs, "copies_printed")?
        .parse::<i32>()
        .map_err(|_| "copies printed must be a whole number".to_string())?;
    let publisher_id = required(pairs, "publisher_id")?
        .parse::<i32>()
        .map_err(|_| "a publisher must be selected".to_string())?;

    let publication_date = first(pairs, "publication_date")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| "publication date must be YYYY-MM-DD".to_string())
        })
        .transpose()?;

    let description = first(pairs, "description")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned);
    let cover_image = first(pairs, "cover_image")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned);

    Ok(BookInput {
        title,
        isbn,
        page_count,
        publication_date,
        price,
        stock,
        copies_printed,
        language,
        description,
        cover_image,
        publisher_id,
        author_ids: all_ids(pairs, "author_ids")?,
        category_ids: all_ids(pairs, "category_ids")?,
    })
}

/// Display the book list.
#[instrument(skip(state, session, admin))]
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Query(query): Query<BookQuery>,
) -> Result<impl IntoResponse> {
    let entity = books_admin(&state).await?;

    let params = BookListParams {
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        category_id: query.category,
        publisher_id: query.publisher,
        language: query.language.clone().filter(|s| !s.is_empty()),
        page: query.page.unwrap_or(1).max(1),
    };

    let page = BookAdminRepository::new(state.pool())
        .list(&params, ADMIN_PAGE_SIZE)
        .await?;

    let rows = page
        .rows
        .iter()
        .map(|row| RowView {
            id: row.id,
            cells: vec![
                row.id.to_string(),
                row.title.clone(),
                row.isbn.clone(),
                row.publisher_name.clone(),
                format_eur(row.price),
                row.stock.to_string(),
                row.language.clone(),
            ],
        })
        .collect();

    let current = [
        ("search", query.search.clone().unwrap_or_default()),
        (
            "category",
            query.category.map(|id| id.to_string()).unwrap_or_default(),
        ),
        (
            "publisher",
            query.publisher.map(|id| id.to_string()).unwrap_or_default(),
        ),
        ("language", query.language.clone().unwrap_or_default()),
    ];

    let preserve_params = current
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    Ok(EntityListTemplate {
        ctx: PageContext::build(&session, &admin, "books").await,
        title: entity.plural.to_string(),
        base: format!("/{}", entity.slug),
        filters: FilterView::resolve(&entity, &current),
        columns: entity.columns.clone(),
        rows,
        total: page.total,
        page: params.page,
        total_pages: page.total_pages,
        can_create: entity.allows(admin.role, crate::components::entity_admin::Action::Create),
        can_edit: entity.allows(admin.role, crate::components::entity_admin::Action::Edit),
        can_delete: entity.allows(admin.role, crate::components::entity_admin::Action::Delete),
        preserve_params,
    })
}

async fn form_choices(
    state: &AppState,
    input: Option<&BookInput>,
) -> Result<(Vec<ChoiceView>, Vec<ChoiceView>, Vec<ChoiceView>)> {
    let publishers = PublisherAdminRepository::new(state.pool()).all().await?;
    let authors = AuthorAdminRepository::new(state.pool()).all().await?;
    let categories = CategoryAdminRepository::new(state.pool()).all().await?;

    let selected_publisher = input.map(|i| i.publisher_id);
    let selected_authors: &[i32] = input.map_or(&[], |i| i.author_ids.as_slice());
    let selected_categories: &[i32] = input.map_or(&[], |i| i.category_ids.as_slice());

    Ok((
        publishers
            .iter()
            .map(|p| ChoiceView {
                id: p.id,
                label: p.name.clone(),
                selected: selected_publisher == Some(p.id),
            })
            .collect(),
        authors
            .iter()
            .map(|a| ChoiceView {
                id: a.id,
                label: format!("{} {}", a.first_name, a.last_name),
                selected: selected_authors.contains(&a.id),
            })
            .collect(),
        categories
            .iter()
            .map(|c| ChoiceView {
                id: c.id,
                label: c.name.clone(),
                selected: selected_categories.contains(&c.id),
            })
            .collect(),
    ))
}

/// Display the create form.
#[instrument(skip(state, session, admin))]
pub async fn new_page(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
) -> Result<impl IntoResponse> {
    let (publishers, authors, categories) = form_choices(&state, None).await?;

    Ok(BookFormTemplate {
        ctx: PageContext::build(&session, &admin, "books").await,
        heading: "New book".to_string(),
        action: "/books".to_string(),
        form: BookFormView::default(),
        publishers,
        authors,
        categories,
        error: None,
    })
}

/// Handle the create form.
#[instrument(skip(state, session, admin, pairs))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let input = match parse_book_form(&pairs) {
        Ok(input) => input,
        Err(message) => {
            let (publishers, authors, categories) = form_choices(&state, None).await?;
            return Ok(BookFormTemplate {
                ctx: PageContext::build(&session, &admin, "books").await,
                heading: "New book".to_string(),
                action: "/books".to_string(),
                form: BookFormView::default(),
                publishers,
                authors,
                categories,
                error: Some(message),
            }
            .into_response());
        }
    };

    let id = BookAdminRepository::new(state.pool()).create(&input).await?;
    flash::success(&session, format!("Book \"{}\" created.", input.title)).await;
    tracing::info!(book_id = %id, "book created");
    Ok(Redirect::to("/books").into_response())
}

/// Display the edit form.
#[instrument(skip(state, session, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Path(id): Path<i32>,
) -> Result<Response> {
    let record = match BookAdminRepository::new(state.pool()).get(BookId::new(id)).await {
        Ok(record) => record,
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound(format!("book {id}")));
        }
        Err(e) => return Err(e.into()),
    };

    let (publishers, authors, categories) = form_choices(&state, Some(&record.input)).await?;

    Ok(BookFormTemplate {
        ctx: PageContext::build(&session, &admin, "books").await,
        heading: format!("Edit \"{}\"", record.input.title),
        action: format!("/books/{id}"),
        form: BookFormView::from(&record.input),
        publishers,
        authors,
        categories,
        error: None,
    }
    .into_response())
}

/// Handle the edit form.
#[instrument(skip(state, session, admin, pairs))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
    Path(id): Path<i32>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let input = match parse_book_form(&pairs) {
        Ok(input) => input,
        Err(message) => {
            let (publishers, authors, categories) = form_choices(&state, None).await?;
            return Ok(BookFormTemplate {
                ctx: PageContext::build(&session, &admin, "books").await,
                heading: "Edit book".to_string(),
                action: format!("/books/{id}"),
                form: BookFormView::default(),
                publishers,
                authors,
                categories,
                error: Some(message),
            }
            .into_response());
        }
    };

    BookAdminRepository::new(state.pool())
        .update(BookId::new(id), &input)
        .await?;
    flash::success(&session, format!("Book \"{}\" updated.", input.title)).await;
    Ok(Redirect::to("/books").into_response())
}

/// Delete a book. Requires the admin role.
#[instrument(skip(state, session, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    match BookAdminRepository::new(state.pool()).delete(BookId::new(id)).await {
        Ok(()) => {
            flash::success(&session, "Book deleted.").await;
        }
        Err(RepositoryError::InUse(_)) => {
            flash::error(
                &session,
                "This book appears on existing orders and cannot be deleted.",
            )
            .await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/books").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn valid_form() -> Vec<(String, String)> {
        pairs(&[
            ("title", "Dune"),
            ("isbn", "978-0441172719"),
            ("page_count", "412"),
            ("publication_date", "1965-08-01"),
            ("price", "9.99"),
            ("stock", "10"),
            ("copies_printed", "20000"),
            ("language", "English"),
            ("publisher_id", "1"),
            ("author_ids", "3"),
            ("author_ids", "4"),
            ("category_ids", "2"),
        ])
    }

    #[test]
    fn test_parse_book_form_collects_repeated_ids() {
        let input = parse_book_form(&valid_form()).expect("valid form");
        assert_eq!(input.title, "Dune");
        assert_eq!(input.author_ids, vec![3, 4]);
        assert_eq!(input.category_ids, vec![2]);
        assert_eq!(input.price, Decimal::new(999, 2));
        assert_eq!(
            input.publication_date,
            chrono::NaiveDate::from_ymd_opt(1965, 8, 1)
        );
    }

    #[test]
    fn test_parse_book_form_requires_title() {
        let mut form = valid_form();
        form.retain(|(k, _)| k != "title");
        assert!(parse_book_form(&form).is_err());
    }

    #[test]
    fn test_parse_book_form_rejects_negative_price() {
        let mut form = valid_form();
        for (k, v) in &mut form {
            if k == "price" {
                *v = "-1.00".to_string();
            }
        }
        assert!(parse_book_form(&form).is_err());
    }

    #[test]
    fn test_parse_book_form_rejects_negative_stock() {
        let mut form = valid_form();
        for (k, v) in &mut form {
            if k == "stock" {
                *v = "-2".to_string();
            }
        }
        assert!(parse_book_form(&form).is_err());
    }

    #[test]
    fn test_parse_book_form_optional_date() {
        let mut form = valid_form();
        form.retain(|(k, _)| k != "publication_date");
        let input = parse_book_form(&form).expect("valid form");
        assert!(input.publication_date.is_none());
    }
}
