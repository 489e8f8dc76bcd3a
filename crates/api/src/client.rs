//! HTTP client for the REST API.
//!
//! [`ApiClient`] is created once at startup and shared by every request. A
//! handler turns it into an [`Api`] handle for the current visitor, which
//! carries the bearer token (if any) and the cache scope. Resource methods
//! live on [`Api`] in the `resources` modules.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use vitrine_core::UserId;

use crate::cache::{CacheKey, Cacheable, Resource, ResourceCache, Scope};
use crate::error::ApiError;

/// Client settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; every path is requested under `{base_url}/api`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How long a cached read stays fresh.
    pub cache_ttl: Duration,
    /// Maximum number of cached reads.
    pub cache_capacity: u64,
    /// Extra attempts for a failed read.
    pub read_retries: u32,
    /// Pause between read attempts.
    pub retry_delay: Duration,
}

impl ApiConfig {
    /// Defaults for everything except the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
            cache_capacity: 1000,
            read_retries: 3,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Shared client for the REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    api_root: String,
    cache: ResourceCache,
    read_retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    /// Build the client and its cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let api_root = format!("{}/api", config.base_url.as_str().trim_end_matches('/'));

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                api_root,
                cache: ResourceCache::new(config.cache_capacity, config.cache_ttl),
                read_retries: config.read_retries,
                retry_delay: config.retry_delay,
            }),
        })
    }

    /// Handle for an anonymous visitor.
    #[must_use]
    pub fn anonymous(&self) -> Api {
        Api {
            client: self.clone(),
            caller: None,
        }
    }

    /// Handle acting with `caller`'s credential.
    #[must_use]
    pub fn as_caller(&self, caller: Caller) -> Api {
        Api {
            client: self.clone(),
            caller: Some(caller),
        }
    }

    /// The shared read cache.
    #[must_use]
    pub fn cache(&self) -> &ResourceCache {
        &self.inner.cache
    }

    /// Whether the API host answers at all.
    ///
    /// Any HTTP response counts; only transport failures mean "not ready".
    pub async fn is_reachable(&self) -> bool {
        match self.inner.http.get(&self.inner.api_root).send().await {
            Ok(_) => true,
            Err(e) => {
                warn!("API unreachable: {e}");
                false
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_root)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root", &self.inner.api_root)
            .field("read_retries", &self.inner.read_retries)
            .finish_non_exhaustive()
    }
}

/// The authenticated visitor on whose behalf calls are made.
#[derive(Clone)]
pub struct Caller {
    user_id: UserId,
    token: SecretString,
}

impl Caller {
    #[must_use]
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: SecretString::from(token.into()),
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

impl std::fmt::Debug for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caller")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Per-visitor handle to the API.
#[derive(Debug, Clone)]
pub struct Api {
    client: ApiClient,
    caller: Option<Caller>,
}

impl Api {
    /// The credential in use, if any.
    #[must_use]
    pub const fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    /// Cache scope for reads made through this handle.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.caller
            .as_ref()
            .map_or(Scope::Public, |c| Scope::User(c.user_id.clone()))
    }

    /// Drop every cached read made with this handle's credential.
    ///
    /// Anonymous handles share the public scope, so they drop nothing.
    pub fn forget_cached_reads(&self) {
        if self.caller.is_some() {
            self.client.cache().invalidate_scope(&self.scope());
        }
    }

    /// The shared client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Fail fast when an endpoint needs a credential and there is none.
    pub(crate) fn require_caller(&self) -> Result<&Caller, ApiError> {
        self.caller.as_ref().ok_or(ApiError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            message: None,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.inner.http.request(method, self.client.url(path));
        match &self.caller {
            Some(caller) => builder.bearer_auth(caller.token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and turn non-success statuses into errors.
    async fn execute(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let started = Instant::now();
        let result = builder.send().await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, path, elapsed_ms, "API request failed: {e}");
                return Err(e.into());
            }
        };

        let status = response.status();
        debug!(%method, path, status = status.as_u16(), elapsed_ms, "API request");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(path, "Failed to decode API response: {e}");
            ApiError::from(e)
        })
    }

    /// GET `path`, retrying transport failures and 5xx answers.
    pub(crate) async fn read<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let retries = self.client.inner.read_retries;
        let mut attempt = 0;
        loop {
            let builder = self.request(Method::GET, path).query(query);
            let result = match self.execute(&Method::GET, path, builder).await {
                Ok(response) => Self::decode(path, response).await,
                Err(e) => Err(e),
            };
            match result {
                Err(e) if e.is_retryable() && attempt < retries => {
                    attempt += 1;
                    debug!(path, attempt, "Retrying API read: {e}");
                    tokio::time::sleep(self.client.inner.retry_delay).await;
                }
                other => return other,
            }
        }
    }

    /// Cached GET of `path` under `resource` with `params` as the key.
    pub(crate) async fn read_cached<T>(
        &self,
        resource: Resource,
        params: impl Into<String>,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Cacheable,
    {
        let key = CacheKey::new(resource, self.scope(), params);
        self.client
            .cache()
            .get_or_fetch(key, self.read(path, query))
            .await
    }

    /// Send a mutation and decode its answer. Never retried.
    pub(crate) async fn write<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        invalidates: &[Resource],
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_write(method, path, body).await?;
        let decoded = Self::decode(path, response).await;
        // The API applied the change even if its answer is unreadable.
        self.client.cache().invalidate(invalidates);
        decoded
    }

    /// Send a mutation whose answer body is ignored. Never retried.
    pub(crate) async fn write_discard<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        invalidates: &[Resource],
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send_write(method, path, body).await?;
        self.client.cache().invalidate(invalidates);
        Ok(())
    }

    /// Send a multipart form. Never retried.
    pub(crate) async fn write_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path).multipart(form);
        let response = self.execute(&Method::POST, path, builder).await?;
        Self::decode(path, response).await
    }

    async fn send_write<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(&method, path, builder).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn client(base: Url) -> ApiClient {
        let mut config = ApiConfig::new(base);
        config.retry_delay = Duration::from_millis(1);
        ApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_bearer_token_attached_by_client() {
        let router = Router::new().route(
            "/api/echo",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "auth": auth }))
            }),
        );
        let client = client(serve(router).await);

        let anon: Value = client.anonymous().read("/echo", &[]).await.unwrap();
        assert_eq!(anon["auth"], "");

        let api = client.as_caller(Caller::new("1".into(), "tok-123"));
        let authed: Value = api.read("/echo", &[]).await.unwrap();
        assert_eq!(authed["auth"], "Bearer tok-123");
    }

    #[tokio::test]
    async fn test_reads_retry_server_errors() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/flaky",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
                    } else {
                        (StatusCode::OK, Json(json!({ "ok": true })))
                    }
                }),
            )
            .with_state(Arc::clone(&hits));
        let client = client(serve(router).await);

        let value: Value = client.anonymous().read("/flaky", &[]).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/missing",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::NOT_FOUND, Json(json!({ "error": "Produto não encontrado" })))
                }),
            )
            .with_state(Arc::clone(&hits));
        let client = client(serve(router).await);

        let err = client
            .anonymous()
            .read::<Value>("/missing", &[])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Produto não encontrado");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_writes_are_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/thing",
                axum::routing::post(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::BAD_GATEWAY
                }),
            )
            .with_state(Arc::clone(&hits));
        let client = client(serve(router).await);

        let err = client
            .anonymous()
            .write_discard(Method::POST, "/thing", Some(&json!({})), &[])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = ApiConfig::new(Url::parse(&format!("http://{addr}")).unwrap());
        config.read_retries = 0;
        let client = ApiClient::new(&config).unwrap();

        let err = client.anonymous().read::<Value>("/x", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!client.is_reachable().await);
    }

    #[tokio::test]
    async fn test_forget_cached_reads_drops_only_the_callers_scope() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/cart",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "items": [] }))
                }),
            )
            .with_state(Arc::clone(&hits));
        let client = client(serve(router).await);
        let ana = client.as_caller(Caller::new("1".into(), "tok-ana"));
        let bia = client.as_caller(Caller::new("2".into(), "tok-bia"));

        for api in [&ana, &bia] {
            let _: vitrine_core::Cart = api
                .read_cached(Resource::Cart, String::new(), "/cart", &[])
                .await
                .unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        client.anonymous().forget_cached_reads();
        ana.forget_cached_reads();

        let _: vitrine_core::Cart = bia
            .read_cached(Resource::Cart, String::new(), "/cart", &[])
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        let _: vitrine_core::Cart = ana
            .read_cached(Resource::Cart, String::new(), "/cart", &[])
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_caller_debug_redacts_token() {
        let caller = Caller::new("5".into(), "very-secret");
        let debug = format!("{caller:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
