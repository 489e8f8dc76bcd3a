//! Back-office under `/admin`.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin):
//! anonymous visitors go to `/login`, customers to `/`.
//!
//! ```text
//! GET  /admin                           - Dashboard
//! GET  /admin/products                  - Product list (inactive included)
//! GET  /admin/products/new              - New product form
//! POST /admin/products                  - Create (multipart)
//! GET  /admin/products/{id}/edit        - Edit form
//! POST /admin/products/{id}             - Update (multipart)
//! POST /admin/products/{id}/delete      - Delete
//! GET  /admin/categories ...            - Same shape as products
//! GET  /admin/orders?status=            - Order list
//! GET  /admin/orders/{id}               - Order detail
//! POST /admin/orders/{id}/status        - Change status
//! GET  /admin/users ...                 - Same shape as products (urlencoded)
//! ```

pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod upload;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit))
        .route("/{id}/delete", post(categories::delete))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/new", get(users::new))
        .route("/{id}", post(users::update))
        .route("/{id}/edit", get(users::edit))
        .route("/{id}/delete", post(users::delete))
}

/// Create the admin router, to be nested at `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/orders", order_routes())
        .nest("/users", user_routes())
        .layer(DefaultBodyLimit::max(upload::MAX_BODY_BYTES))
}
