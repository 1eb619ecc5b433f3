//! Dashboard handler: headline statistics and activity feeds.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use mybookstore_core::format_eur;

use crate::db::settings;
use crate::db::stats::{DashboardStats, StatsRepository};
use crate::error::Result;
use crate::middleware::RequireAgent;
use crate::state::AppState;

use super::PageContext;

/// A best-seller row for the dashboard.
#[derive(Clone)]
pub struct BestSellerView {
    pub title: String,
    pub units_sold: i64,
    pub revenue: String,
}

/// A recent-order row for the dashboard.
#[derive(Clone)]
pub struct RecentOrderView {
    pub id: i32,
    pub customer_email: String,
    pub ordered_at: String,
    pub total: String,
}

/// A low-stock row for the dashboard.
#[derive(Clone)]
pub struct LowStockView {
    pub id: i32,
    pub title: String,
    pub stock: i32,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: DashboardStats,
    pub revenue: String,
    pub best_sellers: Vec<BestSellerView>,
    pub recent_orders: Vec<RecentOrderView>,
    pub low_stock: Vec<LowStockView>,
}

/// Display the dashboard.
#[instrument(skip(state, session, admin))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAgent(admin): RequireAgent,
) -> Result<impl IntoResponse> {
    let threshold = settings::stock_alert_threshold(state.pool()).await?;
    let stats_repo = StatsRepository::new(state.pool());

    let stats = stats_repo.dashboard(threshold).await?;
    let best_sellers = stats_repo.best_sellers(5).await?;
    let recent_orders = stats_repo.recent_orders(5).await?;
    let low_stock = stats_repo.low_stock(threshold, 5).await?;

    let revenue = format_eur(stats.total_revenue);

    Ok(DashboardTemplate {
        ctx: PageContext::build(&session, &admin, "dashboard").await,
        stats,
        revenue,
        best_sellers: best_sellers
            .into_iter()
            .map(|b| BestSellerView {
                title: b.title,
                units_sold: b.units_sold,
                revenue: format_eur(b.revenue),
            })
            .collect(),
        recent_orders: recent_orders
            .into_iter()
            .map(|o| RecentOrderView {
                id: o.id,
                customer_email: o.customer_email,
                ordered_at: o.ordered_at.format("%Y-%m-%d %H:%M").to_string(),
                total: format_eur(o.total_amount),
            })
            .collect(),
        low_stock: low_stock
            .into_iter()
            .map(|b| LowStockView {
                id: b.id,
                title: b.title,
                stock: b.stock,
            })
            .collect(),
    })
}
