//! Back-office landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use vitrine_core::{OrderStatus, ProductQuery};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Layout;
use crate::routes::views::OrderRow;
use crate::state::AppState;

const RECENT_ORDERS: usize = 5;

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub products: u64,
    pub categories: usize,
    pub order_count: usize,
    pub pending: usize,
    pub users: usize,
    /// Most recent orders.
    pub orders: Vec<OrderRow>,
}

/// Counts and the latest orders, fetched concurrently.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<DashboardTemplate> {
    let api = state.api_as(&admin);
    let query = ProductQuery::default();
    let (products, categories, orders, users) = tokio::join!(
        api.admin_products(&query),
        api.categories(),
        api.all_orders(None),
        api.users(),
    );
    let (products, categories, mut orders, users) = (products?, categories?, orders?, users?);

    let pending = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count();
    // Newest first; orders without a date sink to the end.
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(DashboardTemplate {
        layout,
        products: products.pagination.total,
        categories: categories.len(),
        order_count: orders.len(),
        pending,
        users: users.len(),
        orders: orders
            .iter()
            .take(RECENT_ORDERS)
            .map(|o| OrderRow::new(o, "/admin/orders"))
            .collect(),
    })
}
