//! Home page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::books::BookRepository;
use crate::error::Result;
use crate::middleware::OptionalUser;
use crate::state::AppState;

use super::PageContext;
use super::catalogue::BookCardView;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home/index.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub latest: Vec<BookCardView>,
    pub featured: Vec<BookCardView>,
}

/// Display the home page: the eight newest books and four featured ones.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> Result<impl IntoResponse> {
    let books = BookRepository::new(state.pool());

    let latest = books.find_latest(8).await?;
    let featured = books.find_featured(4).await?;

    Ok(HomeTemplate {
        ctx: PageContext::build(&session, user.as_ref()).await,
        latest: latest.iter().map(BookCardView::from).collect(),
        featured: featured.iter().map(BookCardView::from).collect(),
    })
}
