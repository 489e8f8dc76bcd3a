//! Application state shared across handlers.

use std::sync::Arc;

use vitrine_api::{Api, ApiClient, ApiError};

use crate::config::StorefrontConfig;
use crate::middleware::{RateLimiterLayer, auth_rate_limiter};
use crate::models::CurrentSession;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
    #[error("invalid auth rate limit settings")]
    RateLimit,
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the configuration, the API client (and
/// through it the HTTP connection pool and read cache) and the login
/// throttle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    auth_limiter: RateLimiterLayer,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the rate limit
    /// settings are invalid.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config.api_config())?;
        let auth_limiter = auth_rate_limiter(config.auth_rate_limit).ok_or(StateError::RateLimit)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                auth_limiter,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The shared API client.
    #[must_use]
    pub fn api_client(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Anonymous API access (public catalog).
    #[must_use]
    pub fn api(&self) -> Api {
        self.inner.api.anonymous()
    }

    /// API access on behalf of a signed-in visitor.
    #[must_use]
    pub fn api_as(&self, current: &CurrentSession) -> Api {
        self.inner.api.as_caller(current.caller())
    }

    /// Throttle for login and registration submissions.
    #[must_use]
    pub fn auth_limiter(&self) -> RateLimiterLayer {
        self.inner.auth_limiter.clone()
    }
}
