//! One module per API resource.
//!
//! Each module adds methods to [`Api`](crate::Api) and defines the payloads
//! it sends. Reads go through the resource cache; mutations invalidate the
//! resources they affect once the API confirms them.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod contact;
pub mod orders;
pub mod products;
pub mod upload;
pub mod users;

pub use addresses::AddressInput;
pub use auth::{AuthSession, Credentials, ProfileUpdate, Registration};
pub use cart::CartItemInput;
pub use categories::CategoryInput;
pub use contact::ContactMessage;
pub use orders::OrderInput;
pub use products::{ProductInput, VariantInput};
pub use upload::ImageUpload;
pub use users::UserInput;

/// Percent-encode an id for use as a path segment.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use url::Url;

    use vitrine_core::{Money, ProductQuery};

    use super::*;
    use crate::{ApiClient, ApiConfig, Caller};

    #[derive(Clone, Default)]
    struct Fake {
        products: Arc<std::sync::Mutex<Vec<Value>>>,
        product_reads: Arc<AtomicUsize>,
    }

    async fn list_products(State(fake): State<Fake>) -> Json<Value> {
        fake.product_reads.fetch_add(1, Ordering::SeqCst);
        let products = fake.products.lock().unwrap().clone();
        let total = products.len();
        Json(json!({
            "products": products,
            "pagination": {"page": 1, "limit": 20, "total": total, "totalPages": 1}
        }))
    }

    async fn create_product(State(fake): State<Fake>, Json(body): Json<Value>) -> StatusCode {
        let mut products = fake.products.lock().unwrap();
        let id = products.len() + 1;
        products.push(json!({"id": id, "name": body["name"], "price": body["price"]}));
        StatusCode::CREATED
    }

    async fn cart_for_token(headers: HeaderMap) -> Json<Value> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .trim_start_matches("Bearer ")
            .to_string();
        Json(json!({
            "items": [{
                "id": 1,
                "quantity": 1,
                "product": {"id": 1, "name": format!("item de {token}"), "price": 10}
            }]
        }))
    }

    async fn client(fake: Fake) -> ApiClient {
        let router = Router::new()
            .route("/api/products", get(list_products).post(create_product))
            .route("/api/cart", get(cart_for_token))
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let mut config = ApiConfig::new(Url::parse(&format!("http://{addr}")).unwrap());
        config.retry_delay = Duration::from_millis(1);
        ApiClient::new(&config).unwrap()
    }

    fn input(name: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: String::new(),
            price: Money::from_cents(9990),
            image: None,
            category_id: None,
            is_active: true,
            variants: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_product_mutation_refreshes_listing() {
        let fake = Fake::default();
        let client = client(fake.clone()).await;
        let admin = client.as_caller(Caller::new("1".into(), "admin-token"));
        let visitor = client.anonymous();
        let query = ProductQuery::default();

        assert!(visitor.products(&query).await.unwrap().products.is_empty());
        assert!(visitor.products(&query).await.unwrap().products.is_empty());
        assert_eq!(fake.product_reads.load(Ordering::SeqCst), 1);

        admin.create_product(&input("Saia Plissada")).await.unwrap();

        let page = visitor.products(&query).await.unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].name, "Saia Plissada");
        assert_eq!(fake.product_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_reads_are_scoped_per_user() {
        let client = client(Fake::default()).await;
        let ana = client.as_caller(Caller::new("1".into(), "ana"));
        let bia = client.as_caller(Caller::new("2".into(), "bia"));

        let ana_cart = ana.cart().await.unwrap();
        let bia_cart = bia.cart().await.unwrap();

        assert_eq!(ana_cart.items[0].product.name, "item de ana");
        assert_eq!(bia_cart.items[0].product.name, "item de bia");
    }

    #[tokio::test]
    async fn test_private_reads_need_a_caller() {
        let client = client(Fake::default()).await;
        let err = client.anonymous().cart().await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
