//! Category pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use vitrine_core::{ProductQuery, filter_products};

use super::views::{CategoryView, ProductCard};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Layout;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryView>,
}

/// All categories.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, layout: Layout) -> Result<CategoriesIndexTemplate> {
    let categories = state.api().categories().await?;
    Ok(CategoriesIndexTemplate {
        layout,
        categories: categories.iter().map(CategoryView::from).collect(),
    })
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub layout: Layout,
    pub category: CategoryView,
    pub products: Vec<ProductCard>,
}

/// One category and its active products.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    layout: Layout,
) -> Result<CategoryShowTemplate> {
    let api = state.api();
    let category = api
        .category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let page = api.products(&ProductQuery::for_category(&category.slug)).await?;
    let products = filter_products(&page.products, Some(&category.slug), None)
        .into_iter()
        .filter(|p| p.is_active)
        .map(ProductCard::from)
        .collect();

    Ok(CategoryShowTemplate {
        layout,
        category: CategoryView::from(&category),
        products,
    })
}
