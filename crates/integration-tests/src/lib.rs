//! End-to-end harness for the storefront.
//!
//! Each test spawns a [`FakeApi`] and a storefront wired to it, both on
//! ephemeral ports, then drives the storefront with a cookie-keeping HTTP
//! client that does not follow redirects.
//!
//! ```rust,ignore
//! let api = FakeApi::new();
//! api.add_user("Ana", "ana@example.com", "segredo1", CUSTOMER);
//! let app = TestApp::spawn(api).await;
//! let response = app.login("ana@example.com", "segredo1").await;
//! assert_eq!(location(&response), Some("/"));
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

pub mod fake_api;

use std::collections::HashMap;
use std::net::SocketAddr;

use reqwest::redirect::Policy;
use reqwest::{Client, Response};

use vitrine_storefront::config::StorefrontConfig;
use vitrine_storefront::state::AppState;

pub use fake_api::{ADMIN, CUSTOMER, FakeApi, FakeUser};

/// A running storefront and the fake API behind it.
pub struct TestApp {
    pub address: String,
    pub api: FakeApi,
    pub client: Client,
}

impl TestApp {
    /// Spawn with test defaults: generous rate limit, no read retries.
    pub async fn spawn(api: FakeApi) -> Self {
        Self::spawn_with(api, &[]).await
    }

    /// Spawn with extra environment variables overriding the defaults.
    pub async fn spawn_with(api: FakeApi, overrides: &[(&str, &str)]) -> Self {
        let api_url = api.clone().spawn().await;

        let mut vars: HashMap<String, String> = [
            ("VITRINE_API_URL", api_url.as_str()),
            ("STOREFRONT_BASE_URL", "http://127.0.0.1"),
            ("AUTH_RATE_LIMIT_BURST", "1000"),
            ("AUTH_RATE_LIMIT_PERIOD_SECS", "1"),
            ("API_READ_RETRIES", "0"),
            ("API_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        vars.extend(
            overrides
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );

        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("valid test configuration");
        let state = AppState::new(config).expect("application state");
        let router = vitrine_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront");
        let addr = listener.local_addr().expect("storefront address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("storefront server");
        });

        Self {
            address: format!("http://{addr}"),
            api,
            client: new_client(),
        }
    }

    /// Same storefront, fresh cookie jar: a second visitor.
    #[must_use]
    pub fn visitor(&self) -> Self {
        Self {
            address: self.address.clone(),
            api: self.api.clone(),
            client: new_client(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request")
    }

    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("multipart POST request")
    }

    /// Submit the login form.
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    /// GET `path` and return the body, asserting a 200.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), 200, "GET {path}");
        response.text().await.expect("response body")
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("HTTP client")
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
