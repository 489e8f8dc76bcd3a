//! Home page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use vitrine_core::ProductQuery;

use super::views::{CategoryView, ProductCard};
use crate::error::Result;
use crate::filters;
use crate::models::Layout;
use crate::state::AppState;

/// Products shown in the featured grid.
const FEATURED_COUNT: usize = 8;

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryView>,
    /// Featured products, named for the shared product grid.
    pub products: Vec<ProductCard>,
}

/// Categories and the first active products.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, layout: Layout) -> Result<HomeTemplate> {
    let api = state.api();
    let query = ProductQuery::default();
    let (categories, page) = tokio::join!(api.categories(), api.products(&query));

    let featured = page?
        .products
        .iter()
        .filter(|p| p.is_active)
        .take(FEATURED_COUNT)
        .map(ProductCard::from)
        .collect();

    Ok(HomeTemplate {
        layout,
        categories: categories?.iter().map(CategoryView::from).collect(),
        products: featured,
    })
}
