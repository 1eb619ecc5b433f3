//! Catalogue route handlers: filtered listing and book detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mybookstore_core::{BookId, CategoryId, PublisherId, format_eur};

use crate::db::books::{BookFilter, BookRepository, CATALOGUE_PAGE_SIZE, SortKey};
use crate::db::taxonomies::TaxonomyRepository;
use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::models::book::{Book, Category, Publisher};
use crate::state::AppState;

use super::PageContext;

/// Book display data for listing cards.
#[derive(Clone)]
pub struct BookCardView {
    pub id: i32,
    pub title: String,
    pub authors: String,
    pub price: String,
    pub cover_image: Option<String>,
    pub stock: i32,
}

impl From<&Book> for BookCardView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.as_i32(),
            title: book.title.clone(),
            authors: book.author_names(),
            price: format_eur(book.price),
            cover_image: book.cover_image.clone(),
            stock: book.stock,
        }
    }
}

/// Full book display data for the detail page.
#[derive(Clone)]
pub struct BookDetailView {
    pub id: i32,
    pub title: String,
    pub authors: String,
    pub categories: String,
    pub publisher: String,
    pub isbn: String,
    pub page_count: i32,
    pub publication_date: Option<String>,
    pub language: String,
    pub price: String,
    pub stock: i32,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

impl From<&Book> for BookDetailView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.as_i32(),
            title: book.title.clone(),
            authors: book.author_names(),
            categories: book
                .categories
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
                .join(", "),
            publisher: book.publisher.name.clone(),
            isbn: book.isbn.clone(),
            page_count: book.page_count,
            publication_date: book.publication_date.map(|d| d.format("%Y-%m-%d").to_string()),
            language: book.language.clone(),
            price: format_eur(book.price),
            stock: book.stock,
            description: book.description.clone(),
            cover_image: book.cover_image.clone(),
        }
    }
}

/// Catalogue query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogueQuery {
    pub category: Option<i32>,
    pub publisher: Option<i32>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
}

impl CatalogueQuery {
    /// Convert to the repository filter, dropping blank search terms.
    fn to_filter(&self) -> BookFilter {
        BookFilter {
            category_id: self.category.map(CategoryId::new),
            publisher_id: self.publisher.map(PublisherId::new),
            price_min: self.price_min,
            price_max: self.price_max,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned),
        }
    }

    fn sort_key(&self) -> SortKey {
        self.sort.as_deref().map(SortKey::from_param).unwrap_or_default()
    }
}

/// Build the query string preserved across pagination links (everything
/// except `page`).
#[must_use]
pub fn preserve_params(query: &CatalogueQuery) -> String {
    let mut params: Vec<String> = Vec::new();
    if let Some(id) = query.category {
        params.push(format!("category={id}"));
    }
    if let Some(id) = query.publisher {
        params.push(format!("publisher={id}"));
    }
    if let Some(min) = query.price_min {
        params.push(format!("price_min={min}"));
    }
    if let Some(max) = query.price_max {
        params.push(format!("price_max={max}"));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        params.push(format!("search={}", urlencode(search)));
    }
    if let Some(sort) = &query.sort {
        params.push(format!("sort={sort}"));
    }
    params.join("&")
}

/// Percent-encode a query-string value.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// A sidebar filter option with its selection state resolved.
#[derive(Clone)]
pub struct OptionView {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

impl OptionView {
    fn for_categories(categories: &[Category], selected: Option<i32>) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self {
                id: c.id.as_i32(),
                name: c.name.clone(),
                selected: selected == Some(c.id.as_i32()),
            })
            .collect()
    }

    fn for_publishers(publishers: &[Publisher], selected: Option<i32>) -> Vec<Self> {
        publishers
            .iter()
            .map(|p| Self {
                id: p.id.as_i32(),
                name: p.name.clone(),
                selected: selected == Some(p.id.as_i32()),
            })
            .collect()
    }
}

/// Catalogue listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalogue/index.html")]
pub struct CatalogueTemplate {
    pub ctx: PageContext,
    pub books: Vec<BookCardView>,
    pub total: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub categories: Vec<OptionView>,
    pub publishers: Vec<OptionView>,
    pub search: String,
    pub sort: &'static str,
    pub preserve_params: String,
}

/// Book detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalogue/show.html")]
pub struct BookShowTemplate {
    pub ctx: PageContext,
    pub book: BookDetailView,
    pub similar: Vec<BookCardView>,
}

/// Display the catalogue with filters, sorting and pagination.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Query(query): Query<CatalogueQuery>,
) -> Result<impl IntoResponse> {
    let books = BookRepository::new(state.pool());
    let taxonomies = TaxonomyRepository::new(state.pool());

    let page = query.page.unwrap_or(1).max(1);
    let sort = query.sort_key();

    let result = books
        .find_with_filters(&query.to_filter(), sort, page, CATALOGUE_PAGE_SIZE)
        .await?;

    let categories = taxonomies.categories().await?;
    let publishers = taxonomies.publishers().await?;

    Ok(CatalogueTemplate {
        ctx: PageContext::build(&session, user.as_ref()).await,
        books: result.items.iter().map(BookCardView::from).collect(),
        total: result.total,
        total_pages: result.total_pages,
        current_page: result.current_page,
        categories: OptionView::for_categories(&categories, query.category),
        publishers: OptionView::for_publishers(&publishers, query.publisher),
        search: query.search.clone().unwrap_or_default(),
        sort: sort.as_param(),
        preserve_params: preserve_params(&query),
    })
}

/// Display a book's detail page with similar books.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let books = BookRepository::new(state.pool());

    let book = books.find_by_id(BookId::new(id)).await.map_err(|e| match e {
        crate::db::RepositoryError::NotFound => {
            AppError::NotFound(format!("book {id} does not exist"))
        }
        other => AppError::Database(other),
    })?;

    let similar = books.find_similar(&book, 4).await?;

    Ok(BookShowTemplate {
        ctx: PageContext::build(&session, user.as_ref()).await,
        book: BookDetailView::from(&book),
        similar: similar.iter().map(BookCardView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserve_params_skips_page_and_blanks() {
        let query = CatalogueQuery {
            category: Some(2),
            search: Some("  ".to_string()),
            sort: Some("price_asc".to_string()),
            page: Some(4),
            ..CatalogueQuery::default()
        };
        assert_eq!(preserve_params(&query), "category=2&sort=price_asc");
    }

    #[test]
    fn test_preserve_params_encodes_search() {
        let query = CatalogueQuery {
            search: Some("jules verne & co".to_string()),
            ..CatalogueQuery::default()
        };
        assert_eq!(preserve_params(&query), "search=jules+verne+%26+co");
    }

    #[test]
    fn test_to_filter_drops_blank_search() {
        let query = CatalogueQuery {
            search: Some("   ".to_string()),
            ..CatalogueQuery::default()
        };
        assert!(query.to_filter().search.is_none());

        let query = CatalogueQuery {
            search: Some(" hugo ".to_string()),
            ..CatalogueQuery::default()
        };
        assert_eq!(query.to_filter().search.as_deref(), Some("hugo"));
    }

    #[test]
    fn test_sort_key_defaults_to_newest() {
        assert_eq!(CatalogueQuery::default().sort_key(), SortKey::Newest);
    }
}
