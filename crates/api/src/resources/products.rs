//! Products.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{CategoryId, Money, Product, ProductId, ProductPage, ProductQuery};

use super::segment;
use crate::cache::Resource;
use crate::client::Api;
use crate::error::ApiError;

/// Resources whose cached reads embed product data.
const PRODUCT_DEPENDENTS: &[Resource] = &[Resource::Products, Resource::Categories, Resource::Cart];

/// Variant fields of a product form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub stock: i32,
}

/// Product create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    pub is_active: bool,
    pub variants: Vec<VariantInput>,
}

impl Api {
    /// Storefront listing: active products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        self.read_cached(
            Resource::Products,
            query.cache_key(),
            "/products",
            &query.to_query_pairs(),
        )
        .await
    }

    /// Back-office listing, inactive products included.
    ///
    /// # Errors
    ///
    /// Returns an error without a credential or if the API request fails.
    #[instrument(skip(self))]
    pub async fn admin_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        self.require_caller()?;
        self.read_cached(
            Resource::Products,
            format!("admin?{}", query.cache_key()),
            "/products/admin",
            &query.to_query_pairs(),
        )
        .await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.read_cached(
            Resource::Products,
            format!("id={id}"),
            &format!("/products/{}", segment(id.as_str())),
            &[],
        )
        .await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the product or the call fails.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(Method::POST, "/products", Some(input), PRODUCT_DEPENDENTS)
            .await
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the change or the call fails.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::PUT,
            &format!("/products/{}", segment(id.as_str())),
            Some(input),
            PRODUCT_DEPENDENTS,
        )
        .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the deletion or the call fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::DELETE,
            &format!("/products/{}", segment(id.as_str())),
            None::<&()>,
            PRODUCT_DEPENDENTS,
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::State;
    use axum::routing::get;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::client::{ApiClient, ApiConfig};

    async fn counting_server(hits: Arc<AtomicUsize>) -> Url {
        let router = Router::new()
            .route(
                "/api/products",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    axum::Json(json!({ "products": [] }))
                }),
            )
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn test_filter_values_cannot_share_a_cache_entry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = counting_server(Arc::clone(&hits)).await;
        let client = ApiClient::new(&ApiConfig::new(base)).unwrap();
        let api = client.anonymous();

        api.products(&ProductQuery::for_category("a&search=b"))
            .await
            .unwrap();
        api.products(&ProductQuery {
            category_slug: Some("a".into()),
            search: Some("b".into()),
            ..ProductQuery::default()
        })
        .await
        .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        api.products(&ProductQuery::for_category("a&search=b"))
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_product_input_wire_shape() {
        let input = ProductInput {
            name: "Vestido Midi".into(),
            description: String::new(),
            price: Money::from_cents(18990),
            image: None,
            category_id: Some("3".into()),
            is_active: true,
            variants: vec![VariantInput {
                size: "P".into(),
                color: None,
                stock: 4,
            }],
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["categoryId"], "3");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["variants"][0]["stock"], 4);
        assert!(json.get("image").is_none());
        assert!(json["variants"][0].get("color").is_none());
    }
}
