//! Product listing and detail pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use vitrine_core::{Money, ProductId, ProductQuery, filter_products};

use super::views::{CategoryView, ProductCard, SelectOption, non_blank};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Layout;
use crate::state::AppState;

/// Page size requested from the API.
const PAGE_SIZE: u32 = 12;

/// Listing filters as they appear in the page's query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub in_stock: Option<String>,
    pub page: Option<String>,
}

impl ListingParams {
    /// API query for these filters. Unparseable values are ignored.
    #[must_use]
    pub fn to_query(&self) -> ProductQuery {
        ProductQuery {
            category_slug: non_blank(self.category.as_deref()),
            min_price: self.min_price.as_deref().and_then(parse_money),
            max_price: self.max_price.as_deref().and_then(parse_money),
            in_stock: self.in_stock_only().then_some(true),
            search: non_blank(self.search.as_deref()),
            limit: Some(PAGE_SIZE),
            page: self.page.as_deref().and_then(|p| p.trim().parse().ok()),
        }
        .normalized()
    }

    fn in_stock_only(&self) -> bool {
        matches!(
            self.in_stock.as_deref().map(str::trim),
            Some("true" | "on" | "1")
        )
    }

    /// Link to `page` of this listing.
    #[must_use]
    pub fn href(&self, page: u32) -> String {
        let query = self.to_query();
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(slug) = &query.category_slug {
            pairs.push(("category", slug.clone()));
        }
        if let Some(search) = &query.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(min) = query.min_price {
            pairs.push(("minPrice", min.to_form_value()));
        }
        if let Some(max) = query.max_price {
            pairs.push(("maxPrice", max.to_form_value()));
        }
        if query.in_stock == Some(true) {
            pairs.push(("inStock", "true".to_string()));
        }
        pairs.push(("page", page.to_string()));

        let query_string = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("/products?{query_string}")
    }
}

fn parse_money(raw: &str) -> Option<Money> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub categories: Vec<SelectOption>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub in_stock: bool,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

/// Product listing.
///
/// Filters go to the API; category and search are applied again in memory
/// and inactive products are hidden.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
    layout: Layout,
) -> Result<ProductsIndexTemplate> {
    let query = params.to_query();
    let api = state.api();
    let (page, categories) = tokio::join!(api.products(&query), api.categories());
    let page = page?;

    let products = filter_products(
        &page.products,
        query.category_slug.as_deref(),
        query.search.as_deref(),
    )
    .into_iter()
    .filter(|p| p.is_active)
    .map(ProductCard::from)
    .collect();

    let selected = query.category_slug.clone().unwrap_or_default();
    let categories = categories?
        .iter()
        .map(|c| SelectOption::new(c.slug.clone(), c.name.clone(), c.slug == selected))
        .collect();

    let current = page.pagination.page.max(1);
    let total_pages = page.pagination.total_pages.max(1);

    Ok(ProductsIndexTemplate {
        layout,
        products,
        categories,
        search: query.search.clone().unwrap_or_default(),
        min_price: query.min_price.map(|m| m.to_form_value()).unwrap_or_default(),
        max_price: query.max_price.map(|m| m.to_form_value()).unwrap_or_default(),
        in_stock: query.in_stock == Some(true),
        total: page.pagination.total,
        page: current,
        total_pages,
        prev_href: (current > 1).then(|| params.href(current - 1)),
        next_href: (current < total_pages).then(|| params.href(current + 1)),
    })
}

/// Variant choice on the detail page.
#[derive(Debug, Clone)]
pub struct VariantOption {
    pub id: String,
    pub label: String,
    pub stock: i32,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: Option<String>,
    pub category: Option<CategoryView>,
    pub sizes: String,
    pub variants: Vec<VariantOption>,
    pub has_variants: bool,
    pub in_stock: bool,
}

/// Product detail with the add-to-cart form.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    layout: Layout,
) -> Result<ProductShowTemplate> {
    let product = state.api().product(&ProductId::from(id.as_str())).await?;
    if !product.is_active {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let variants: Vec<VariantOption> = product
        .purchasable_variants()
        .map(|v| VariantOption {
            id: v.id.to_string(),
            label: v.label(),
            stock: v.stock,
        })
        .collect();

    Ok(ProductShowTemplate {
        layout,
        id: product.id.to_string(),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price.display(),
        image: product.image.clone(),
        category: product.category.as_ref().map(|c| CategoryView {
            id: c.id.to_string(),
            name: c.name.clone(),
            slug: c.slug.clone(),
            href: format!("/categories/{}", urlencoding::encode(&c.slug)),
            description: None,
            image: None,
        }),
        sizes: product.available_sizes().join(", "),
        has_variants: !product.variants.is_empty(),
        in_stock: product.in_stock(),
        variants,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListingParams {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/products?{query}").parse().unwrap();
        Query::<ListingParams>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_listing_params_to_query() {
        let query = params(&[
            ("category", "vestidos"),
            ("minPrice", "50,00"),
            ("maxPrice", "abc"),
            ("inStock", "on"),
            ("page", "2"),
        ])
        .to_query();
        assert_eq!(query.category_slug.as_deref(), Some("vestidos"));
        assert_eq!(query.min_price, Some(Money::from_cents(5000)));
        assert_eq!(query.max_price, None);
        assert_eq!(query.in_stock, Some(true));
        assert_eq!(query.page, Some(2));
        assert_eq!(query.limit, Some(PAGE_SIZE));
    }

    #[test]
    fn test_blank_filters_are_dropped() {
        let query = params(&[("category", ""), ("search", "  "), ("page", "0")]).to_query();
        assert!(query.category_slug.is_none());
        assert!(query.search.is_none());
        assert!(query.page.is_none());
    }

    #[test]
    fn test_href_keeps_filters() {
        let p = params(&[("search", "saia+jeans"), ("category", "saias")]);
        assert_eq!(p.href(3), "/products?category=saias&search=saia%20jeans&page=3");
    }
}
