//! HTTP route handlers for the storefront and back-office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//!
//! # Catalog
//! GET  /products                      - Product listing (filters in the query)
//! GET  /products/{id}                 - Product detail
//! GET  /categories                    - Category listing
//! GET  /categories/{slug}             - Category page
//!
//! # Cart (requires session)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add a product
//! POST /cart/items/{id}               - Change quantity (0 removes)
//! POST /cart/items/{id}/remove        - Remove a line
//!
//! # Checkout (requires session)
//! GET  /checkout                      - Address and payment choice
//! POST /checkout                      - Place the order
//!
//! # Auth
//! GET  /login                         - Login page (public only)
//! POST /login                         - Login action (rate limited)
//! GET  /register                      - Register page (public only)
//! POST /register                      - Register action (rate limited)
//! POST /logout                        - Logout action
//!
//! # Account (requires session)
//! GET  /account                       - Profile
//! POST /account                       - Update profile
//! GET  /account/orders                - Order history
//! GET  /account/orders/{id}           - Order detail
//! GET  /account/addresses             - Address book
//! POST /account/addresses             - Add an address
//! POST /account/addresses/{id}/delete - Delete an address
//!
//! # Contact
//! GET  /contact                       - Contact form
//! POST /contact/send                  - Send a message
//!
//! # Back-office
//! /admin/...                          - See [`admin`]
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod products;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(categories::index))
        .route("/categories/{slug}", get(categories::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/items/{id}", post(cart::update))
        .route("/items/{id}/remove", post(cart::remove))
}

/// Create the auth routes router.
///
/// Only credential submissions pass through the rate limiter; the pages
/// themselves are not throttled.
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(state.auth_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(state.auth_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile).post(account::update_profile))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create all routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .merge(auth_routes(state))
        .nest("/account", account_routes())
        .route("/contact", get(contact::show))
        .route("/contact/send", post(contact::send))
        .nest("/admin", admin::routes())
}
