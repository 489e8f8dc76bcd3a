//! In-memory stand-in for the retailer's REST API.
//!
//! Speaks the same JSON as the real API under `/api`, issues signed JWT
//! bearer tokens carrying `sub` and `exp`, and records every request so
//! tests can assert which calls were (or were not) made.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Value, json};

pub const ADMIN: &str = "ADMIN";
pub const CUSTOMER: &str = "CUSTOMER";

/// A user account known to the fake API.
#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub password: String,
}

impl FakeUser {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
            "role": self.role,
            "createdAt": "2024-03-01T12:00:00Z",
        })
    }

    fn is_admin(&self) -> bool {
        self.role == ADMIN
    }
}

#[derive(Debug, Clone)]
struct CartLine {
    id: u64,
    product_id: u64,
    variant_id: Option<u64>,
    quantity: u64,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    token_ttl_secs: i64,
    revoked: bool,
    users: Vec<FakeUser>,
    categories: Vec<Value>,
    products: Vec<Value>,
    carts: HashMap<u64, Vec<CartLine>>,
    addresses: HashMap<u64, Vec<Value>>,
    orders: Vec<(u64, Value)>,
    messages: Vec<Value>,
    requests: Vec<(String, String)>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: u64) -> Option<&FakeUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn product(&self, id: u64) -> Option<&Value> {
        self.products.iter().find(|p| id_of(&p["id"]) == Some(id))
    }

    fn category_ref(&self, id: u64) -> Option<Value> {
        self.categories
            .iter()
            .find(|c| id_of(&c["id"]) == Some(id))
            .map(|c| json!({"id": c["id"], "name": c["name"], "slug": c["slug"]}))
    }

    fn cart_json(&self, user_id: u64) -> Value {
        let lines = self.carts.get(&user_id).cloned().unwrap_or_default();
        let mut total = 0;
        let items: Vec<Value> = lines
            .iter()
            .filter_map(|line| {
                let product = self.product(line.product_id)?.clone();
                let variant = line.variant_id.and_then(|vid| {
                    product["variants"]
                        .as_array()
                        .and_then(|vs| vs.iter().find(|v| id_of(&v["id"]) == Some(vid)))
                        .cloned()
                });
                total += cents(&product["price"]) * i64::try_from(line.quantity).unwrap_or(0);
                Some(json!({
                    "id": line.id,
                    "product": product,
                    "variant": variant,
                    "quantity": line.quantity,
                }))
            })
            .collect();
        json!({"items": items, "total": money(total)})
    }

    /// Build a product record from a create/update payload.
    fn product_json(&mut self, id: u64, body: &Value) -> Value {
        let category_id = id_of(&body["categoryId"]);
        let variants: Vec<Value> = body["variants"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                json!({
                    "id": self.next_id(),
                    "size": v["size"],
                    "color": v["color"],
                    "stock": v["stock"],
                })
            })
            .collect();
        json!({
            "id": id,
            "name": body["name"],
            "description": body["description"].as_str().unwrap_or_default(),
            "price": money(cents(&body["price"])),
            "image": body["image"],
            "categoryId": category_id,
            "category": category_id.and_then(|c| self.category_ref(c)),
            "isActive": body["isActive"].as_bool().unwrap_or(true),
            "variants": variants,
        })
    }
}

/// Fake REST API; clones share one store.
#[derive(Clone)]
pub struct FakeApi {
    store: Arc<Mutex<Store>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeApi {
    /// Empty API issuing tokens valid for one hour.
    #[must_use]
    pub fn new() -> Self {
        let store = Store {
            token_ttl_secs: 3600,
            ..Store::default()
        };
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Issue tokens that expire `secs` after login (negative: already expired).
    #[must_use]
    pub fn with_token_ttl(self, secs: i64) -> Self {
        self.lock().token_ttl_secs = secs;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an account and return its id.
    pub fn add_user(&self, name: &str, email: &str, password: &str, role: &str) -> u64 {
        let mut store = self.lock();
        let id = store.next_id();
        store.users.push(FakeUser {
            id,
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            role: role.to_string(),
            password: password.to_string(),
        });
        id
    }

    /// Add a category and return its id.
    pub fn add_category(&self, name: &str, slug: &str) -> u64 {
        let mut store = self.lock();
        let id = store.next_id();
        store
            .categories
            .push(json!({"id": id, "name": name, "slug": slug}));
        id
    }

    /// Add an active product with `(size, stock)` variants and return its id.
    pub fn add_product(
        &self,
        name: &str,
        price_cents: i64,
        category_id: Option<u64>,
        variants: &[(&str, i32)],
    ) -> u64 {
        let mut store = self.lock();
        let id = store.next_id();
        let body = json!({
            "name": name,
            "price": money(price_cents),
            "categoryId": category_id,
            "isActive": true,
            "variants": variants
                .iter()
                .map(|(size, stock)| json!({"size": size, "stock": stock}))
                .collect::<Vec<_>>(),
        });
        let product = store.product_json(id, &body);
        store.products.push(product);
        id
    }

    /// Ids of the variants of a product, in order.
    #[must_use]
    pub fn variant_ids(&self, product_id: u64) -> Vec<u64> {
        self.lock()
            .product(product_id)
            .and_then(|p| p["variants"].as_array().cloned())
            .unwrap_or_default()
            .iter()
            .filter_map(|v| id_of(&v["id"]))
            .collect()
    }

    /// Reject every token from now on, as if they had been revoked.
    pub fn revoke_tokens(&self) {
        self.lock().revoked = true;
    }

    /// How many `method path` requests were received.
    #[must_use]
    pub fn request_count(&self, method: &str, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    #[must_use]
    pub fn categories(&self) -> Vec<Value> {
        self.lock().categories.clone()
    }

    #[must_use]
    pub fn products(&self) -> Vec<Value> {
        self.lock().products.clone()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.lock().orders.iter().map(|(_, o)| o.clone()).collect()
    }

    #[must_use]
    pub fn users(&self) -> Vec<FakeUser> {
        self.lock().users.clone()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Value> {
        self.lock().messages.clone()
    }

    /// Serve on an ephemeral port and return the base URL (without `/api`).
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(self) -> String {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake API");
        let addr = listener.local_addr().expect("fake API address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake API server");
        });
        format!("http://{addr}")
    }

    fn router(self) -> Router {
        Router::new()
            .route("/api", get(|| async { Json(json!({"status": "ok"})) }))
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/me", get(me))
            .route("/api/auth/profile", put(update_profile))
            .route("/api/products", get(list_products).post(create_product))
            .route("/api/products/admin", get(admin_products))
            .route(
                "/api/products/{id}",
                get(show_product).put(update_product).delete(delete_product),
            )
            .route("/api/categories", get(list_categories).post(create_category))
            .route(
                "/api/categories/{id}",
                get(show_category)
                    .put(update_category)
                    .delete(delete_category),
            )
            .route("/api/cart", get(show_cart))
            .route("/api/cart/items", post(add_cart_item))
            .route(
                "/api/cart/items/{id}",
                put(update_cart_item).delete(remove_cart_item),
            )
            .route("/api/addresses", get(list_addresses).post(create_address))
            .route(
                "/api/addresses/{id}",
                put(update_address).delete(delete_address),
            )
            .route("/api/orders", get(my_orders).post(create_order))
            .route("/api/orders/{id}", get(show_order))
            .route("/api/orders/admin/all", get(all_orders))
            .route("/api/orders/admin/{id}/status", patch(update_order_status))
            .route("/api/users", get(list_users).post(create_user))
            .route(
                "/api/users/{id}",
                get(show_user).put(update_user).delete(delete_user),
            )
            .route("/api/contact/send", post(send_contact))
            .route("/api/upload", post(upload))
            .layer(axum::middleware::from_fn_with_state(self.clone(), record))
            .with_state(self)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Numeric id from a JSON number or numeric string.
fn id_of(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Centavos from a JSON number or decimal string ("249.90", "249,90").
fn cents(value: &Value) -> i64 {
    let text = match value {
        Value::String(s) => s.replace(',', "."),
        Value::Number(n) => n.to_string(),
        _ => return 0,
    };
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "0"));
    let frac = format!("{frac:0<2}");
    whole.parse::<i64>().unwrap_or(0) * 100 + frac.get(..2).and_then(|f| f.parse().ok()).unwrap_or(0)
}

fn money(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Signing key of the fake API; the storefront never sees it.
const TOKEN_SECRET: &[u8] = b"fake-api-secret";

fn issue_token(user_id: u64, ttl_secs: i64) -> String {
    let claims = json!({"sub": user_id.to_string(), "iat": now(), "exp": now() + ttl_secs});
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TOKEN_SECRET),
    )
    .expect("sign fake token")
}

fn verify_token(token: &str) -> Option<Value> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    jsonwebtoken::decode::<Value>(token, &DecodingKey::from_secret(TOKEN_SECRET), &validation)
        .ok()
        .map(|data| data.claims)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Não encontrado")
}

/// The user behind the bearer token.
fn caller(store: &Store, headers: &HeaderMap) -> Result<FakeUser, Response> {
    let unauthorized = || error(StatusCode::UNAUTHORIZED, "Token inválido");
    if store.revoked {
        return Err(unauthorized());
    }
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    let claims = verify_token(token).ok_or_else(unauthorized)?;
    id_of(&claims["sub"])
        .and_then(|id| store.user(id))
        .cloned()
        .ok_or_else(unauthorized)
}

fn admin(store: &Store, headers: &HeaderMap) -> Result<FakeUser, Response> {
    let user = caller(store, headers)?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(error(StatusCode::FORBIDDEN, "Acesso restrito"))
    }
}

fn path_id(raw: &str) -> Result<u64, Response> {
    raw.parse().map_err(|_| not_found())
}

async fn record(State(api): State<FakeApi>, request: Request, next: Next) -> Response {
    api.lock()
        .requests
        .push((request.method().to_string(), request.uri().path().to_string()));
    next.run(request).await
}

type Reply = Result<Response, Response>;

// =============================================================================
// Auth
// =============================================================================

fn session_reply(store: &Store, user: &FakeUser, status: StatusCode) -> Response {
    let token = issue_token(user.id, store.token_ttl_secs);
    (status, Json(json!({"token": token, "user": user.to_json()}))).into_response()
}

async fn login(State(api): State<FakeApi>, Json(body): Json<Value>) -> Response {
    let store = api.lock();
    let user = store
        .users
        .iter()
        .find(|u| Some(u.email.as_str()) == body["email"].as_str())
        .filter(|u| Some(u.password.as_str()) == body["password"].as_str());
    match user {
        Some(user) => session_reply(&store, user, StatusCode::OK),
        None => error(StatusCode::UNAUTHORIZED, "Credenciais inválidas"),
    }
}

async fn register(State(api): State<FakeApi>, Json(body): Json<Value>) -> Response {
    let mut store = api.lock();
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if store.users.iter().any(|u| u.email == email) {
        return error(StatusCode::CONFLICT, "E-mail já cadastrado");
    }
    let user = FakeUser {
        id: store.next_id(),
        name: body["name"].as_str().unwrap_or_default().to_string(),
        email,
        phone: body["phone"].as_str().map(str::to_string),
        role: CUSTOMER.to_string(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
    };
    store.users.push(user.clone());
    session_reply(&store, &user, StatusCode::CREATED)
}

async fn me(State(api): State<FakeApi>, headers: HeaderMap) -> Reply {
    let store = api.lock();
    Ok(Json(caller(&store, &headers)?.to_json()).into_response())
}

async fn update_profile(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    let id = caller(&store, &headers)?.id;
    let user = store
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(not_found)?;
    if let Some(name) = body["name"].as_str() {
        user.name = name.to_string();
    }
    user.phone = body["phone"].as_str().map(str::to_string);
    if let Some(password) = body["password"].as_str() {
        user.password = password.to_string();
    }
    Ok(Json(json!({"user": user.to_json()})).into_response())
}

// =============================================================================
// Catalog
// =============================================================================

fn product_page(products: Vec<Value>, params: &HashMap<String, String>) -> Response {
    let search = params.get("search").map(|s| s.to_lowercase());
    let slug = params.get("categorySlug");
    let in_stock = params.get("inStock").is_some_and(|v| v == "true");
    let filtered: Vec<Value> = products
        .into_iter()
        .filter(|p| slug.is_none_or(|s| p["category"]["slug"].as_str() == Some(s.as_str())))
        .filter(|p| {
            search.as_ref().is_none_or(|term| {
                p["name"]
                    .as_str()
                    .is_some_and(|n| n.to_lowercase().contains(term.as_str()))
            })
        })
        .filter(|p| {
            !in_stock
                || p["variants"]
                    .as_array()
                    .is_some_and(|vs| vs.iter().any(|v| v["stock"].as_i64() > Some(0)))
        })
        .collect();

    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(20)
        .max(1);
    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
        .max(1);
    let total = filtered.len();
    let products: Vec<Value> = filtered
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();
    Json(json!({
        "products": products,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total.div_ceil(limit).max(1),
        }
    }))
    .into_response()
}

async fn list_products(
    State(api): State<FakeApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let active: Vec<Value> = api
        .lock()
        .products
        .iter()
        .filter(|p| p["isActive"].as_bool() != Some(false))
        .cloned()
        .collect();
    product_page(active, &params)
}

async fn admin_products(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let store = api.lock();
    admin(&store, &headers)?;
    Ok(product_page(store.products.clone(), &params))
}

async fn show_product(State(api): State<FakeApi>, Path(id): Path<String>) -> Reply {
    let store = api.lock();
    let product = store.product(path_id(&id)?).ok_or_else(not_found)?;
    Ok(Json(product.clone()).into_response())
}

async fn create_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = store.next_id();
    let product = store.product_json(id, &body);
    store.products.push(product.clone());
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

async fn update_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = path_id(&id)?;
    let index = store
        .products
        .iter()
        .position(|p| id_of(&p["id"]) == Some(id))
        .ok_or_else(not_found)?;
    let product = store.product_json(id, &body);
    if let Some(slot) = store.products.get_mut(index) {
        *slot = product.clone();
    }
    Ok(Json(product).into_response())
}

async fn delete_product(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = path_id(&id)?;
    let before = store.products.len();
    store.products.retain(|p| id_of(&p["id"]) != Some(id));
    if store.products.len() == before {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_categories(State(api): State<FakeApi>) -> Response {
    Json(api.lock().categories.clone()).into_response()
}

async fn show_category(State(api): State<FakeApi>, Path(id): Path<String>) -> Reply {
    let id = path_id(&id)?;
    let store = api.lock();
    let category = store
        .categories
        .iter()
        .find(|c| id_of(&c["id"]) == Some(id))
        .ok_or_else(not_found)?;
    Ok(Json(category.clone()).into_response())
}

fn slug_taken(store: &Store, slug: &str, except: Option<u64>) -> bool {
    store
        .categories
        .iter()
        .any(|c| c["slug"].as_str() == Some(slug) && id_of(&c["id"]) != except)
}

async fn create_category(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let slug = body["slug"].as_str().unwrap_or_default();
    if slug_taken(&store, slug, None) {
        return Err(error(StatusCode::CONFLICT, "Slug já cadastrado"));
    }
    let id = store.next_id();
    let category = json!({
        "id": id,
        "name": body["name"],
        "slug": slug,
        "description": body["description"],
        "image": body["image"],
    });
    store.categories.push(category.clone());
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

async fn update_category(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = path_id(&id)?;
    let slug = body["slug"].as_str().unwrap_or_default();
    if slug_taken(&store, slug, Some(id)) {
        return Err(error(StatusCode::CONFLICT, "Slug já cadastrado"));
    }
    let category = store
        .categories
        .iter_mut()
        .find(|c| id_of(&c["id"]) == Some(id))
        .ok_or_else(not_found)?;
    *category = json!({
        "id": id,
        "name": body["name"],
        "slug": slug,
        "description": body["description"],
        "image": body["image"],
    });
    Ok(Json(category.clone()).into_response())
}

async fn delete_category(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = path_id(&id)?;
    store.categories.retain(|c| id_of(&c["id"]) != Some(id));
    Ok(StatusCode::NO_CONTENT.into_response())
}

// =============================================================================
// Cart and addresses
// =============================================================================

async fn show_cart(State(api): State<FakeApi>, headers: HeaderMap) -> Reply {
    let store = api.lock();
    let user = caller(&store, &headers)?;
    Ok(Json(store.cart_json(user.id)).into_response())
}

async fn add_cart_item(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    let user = caller(&store, &headers)?;
    let product_id = id_of(&body["productId"]).ok_or_else(not_found)?;
    if store.product(product_id).is_none() {
        return Err(not_found());
    }
    let variant_id = id_of(&body["variantId"]);
    let quantity = body["quantity"].as_u64().unwrap_or(1);
    let line_id = store.next_id();
    let lines = store.carts.entry(user.id).or_default();
    match lines
        .iter_mut()
        .find(|l| l.product_id == product_id && l.variant_id == variant_id)
    {
        Some(line) => line.quantity += quantity,
        None => lines.push(CartLine {
            id: line_id,
            product_id,
            variant_id,
            quantity,
        }),
    }
    Ok((StatusCode::CREATED, Json(store.cart_json(user.id))).into_response())
}

async fn update_cart_item(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    let user = caller(&store, &headers)?;
    let id = path_id(&id)?;
    let line = store
        .carts
        .entry(user.id)
        .or_default()
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or_else(not_found)?;
    line.quantity = body["quantity"].as_u64().unwrap_or(1);
    Ok(Json(store.cart_json(user.id)).into_response())
}

async fn remove_cart_item(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut store = api.lock();
    let user = caller(&store, &headers)?;
    let id = path_id(&id)?;
    store.carts.entry(user.id).or_default().retain(|l| l.id != id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_addresses(State(api): State<FakeApi>, headers: HeaderMap) -> Reply {
    let store = api.lock();
    let user = caller(&store, &headers)?;
    let addresses = store.addresses.get(&user.id).cloned().unwrap_or_default();
    Ok(Json(addresses).into_response())
}

fn address_json(id: u64, body: &Value) -> Value {
    json!({
        "id": id,
        "street": body["street"],
        "number": body["number"],
        "complement": body["complement"],
        "neighborhood": body["neighborhood"],
        "city": body["city"],
        "state": body["state"],
        "zipCode": body["zipCode"],
        "isDefault": body["isDefault"].as_bool().unwrap_or(false),
    })
}

async fn create_address(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    let user = caller(&store, &headers)?;
    let id = store.next_id();
    let address = address_json(id, &body);
    store
        .addresses
        .entry(user.id)
        .or_default()
        .push(address.clone());
    Ok((StatusCode::CREATED, Json(address)).into_response())
}

async fn update_address(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    let user = caller(&store, &headers)?;
    let id = path_id(&id)?;
    let address = store
        .addresses
        .entry(user.id)
        .or_default()
        .iter_mut()
        .find(|a| id_of(&a["id"]) == Some(id))
        .ok_or_else(not_found)?;
    *address = address_json(id, &body);
    Ok(Json(address.clone()).into_response())
}

async fn delete_address(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut store = api.lock();
    let user = caller(&store, &headers)?;
    let id = path_id(&id)?;
    store
        .addresses
        .entry(user.id)
        .or_default()
        .retain(|a| id_of(&a["id"]) != Some(id));
    Ok(StatusCode::NO_CONTENT.into_response())
}

// =============================================================================
// Orders
// =============================================================================

async fn my_orders(State(api): State<FakeApi>, headers: HeaderMap) -> Reply {
    let store = api.lock();
    let user = caller(&store, &headers)?;
    let orders: Vec<Value> = store
        .orders
        .iter()
        .filter(|(owner, _)| *owner == user.id)
        .map(|(_, o)| o.clone())
        .collect();
    Ok(Json(orders).into_response())
}

async fn create_order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    let user = caller(&store, &headers)?;
    let address_id = id_of(&body["addressId"]);
    let address = store
        .addresses
        .get(&user.id)
        .and_then(|list| list.iter().find(|a| id_of(&a["id"]) == address_id))
        .cloned()
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "Endereço inválido"))?;

    let cart = store.cart_json(user.id);
    let items: Vec<Value> = cart["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|item| {
            json!({
                "product": {"id": item["product"]["id"], "name": item["product"]["name"]},
                "variant": item["variant"],
                "quantity": item["quantity"],
                "price": item["product"]["price"],
            })
        })
        .collect();
    if items.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Carrinho vazio"));
    }

    let id = store.next_id();
    let order = json!({
        "id": id,
        "status": "PENDING",
        "total": cart["total"],
        "items": items,
        "address": address,
        "user": {"id": user.id, "name": user.name, "email": user.email},
        "payment": {"method": body["paymentMethod"], "status": "PENDING"},
        "createdAt": chrono::Utc::now().to_rfc3339(),
    });
    store.orders.push((user.id, order.clone()));
    store.carts.remove(&user.id);
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

async fn show_order(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let store = api.lock();
    let user = caller(&store, &headers)?;
    let id = path_id(&id)?;
    let (_, order) = store
        .orders
        .iter()
        .find(|(owner, o)| id_of(&o["id"]) == Some(id) && (*owner == user.id || user.is_admin()))
        .ok_or_else(not_found)?;
    Ok(Json(order.clone()).into_response())
}

async fn all_orders(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let store = api.lock();
    admin(&store, &headers)?;
    let orders: Vec<Value> = store
        .orders
        .iter()
        .map(|(_, o)| o.clone())
        .filter(|o| {
            params
                .get("status")
                .is_none_or(|s| o["status"].as_str() == Some(s.as_str()))
        })
        .collect();
    Ok(Json(orders).into_response())
}

async fn update_order_status(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = path_id(&id)?;
    let (_, order) = store
        .orders
        .iter_mut()
        .find(|(_, o)| id_of(&o["id"]) == Some(id))
        .ok_or_else(not_found)?;
    order["status"] = body["status"].clone();
    Ok(Json(order.clone()).into_response())
}

// =============================================================================
// Users, contact and upload
// =============================================================================

async fn list_users(State(api): State<FakeApi>, headers: HeaderMap) -> Reply {
    let store = api.lock();
    admin(&store, &headers)?;
    let users: Vec<Value> = store.users.iter().map(FakeUser::to_json).collect();
    Ok(Json(users).into_response())
}

async fn show_user(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let store = api.lock();
    admin(&store, &headers)?;
    let user = store.user(path_id(&id)?).ok_or_else(not_found)?;
    Ok(Json(user.to_json()).into_response())
}

async fn create_user(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if store.users.iter().any(|u| u.email == email) {
        return Err(error(StatusCode::CONFLICT, "E-mail já cadastrado"));
    }
    let user = FakeUser {
        id: store.next_id(),
        name: body["name"].as_str().unwrap_or_default().to_string(),
        email,
        phone: body["phone"].as_str().map(str::to_string),
        role: body["role"].as_str().unwrap_or(CUSTOMER).to_string(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
    };
    store.users.push(user.clone());
    Ok((StatusCode::CREATED, Json(user.to_json())).into_response())
}

async fn update_user(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = path_id(&id)?;
    let user = store
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(not_found)?;
    user.name = body["name"].as_str().unwrap_or_default().to_string();
    user.email = body["email"].as_str().unwrap_or_default().to_string();
    user.phone = body["phone"].as_str().map(str::to_string);
    user.role = body["role"].as_str().unwrap_or(CUSTOMER).to_string();
    if let Some(password) = body["password"].as_str() {
        user.password = password.to_string();
    }
    Ok(Json(user.to_json()).into_response())
}

async fn delete_user(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut store = api.lock();
    admin(&store, &headers)?;
    let id = path_id(&id)?;
    store.users.retain(|u| u.id != id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn send_contact(State(api): State<FakeApi>, Json(body): Json<Value>) -> Response {
    api.lock().messages.push(body);
    StatusCode::NO_CONTENT.into_response()
}

async fn upload(State(api): State<FakeApi>, headers: HeaderMap, mut multipart: Multipart) -> Reply {
    admin(&api.lock(), &headers)?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            let name = field.file_name().unwrap_or("upload.bin").to_string();
            return Ok(Json(json!({"imageUrl": format!("https://cdn.example.com/{name}")}))
                .into_response());
        }
    }
    Err(error(StatusCode::BAD_REQUEST, "Arquivo ausente"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents() {
        assert_eq!(cents(&json!("249.90")), 24990);
        assert_eq!(cents(&json!("249,9")), 24990);
        assert_eq!(cents(&json!(50)), 5000);
        assert_eq!(money(13000), "130.00");
    }

    #[test]
    fn test_issued_tokens_expire() {
        let claims = verify_token(&issue_token(4, 3600)).unwrap();
        assert_eq!(claims["sub"], "4");
        assert!(verify_token(&issue_token(4, -60)).is_none());
        assert!(verify_token("not-a-token").is_none());
    }
}
