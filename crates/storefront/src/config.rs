//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VITRINE_API_URL` - Base URL of the REST API (calls go to `{url}/api`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `API_CACHE_TTL_SECS` - Lifetime of cached reads (default: 60)
//! - `API_CACHE_CAPACITY` - Maximum cached reads (default: 1000)
//! - `API_READ_RETRIES` - Retries for failed reads (default: 3)
//! - `SHIPPING_COST` - Flat shipping added to non-empty carts (default: 15.00)
//! - `AUTH_RATE_LIMIT_BURST` - Login/register attempts per burst (default: 5)
//! - `AUTH_RATE_LIMIT_PERIOD_SECS` - Seconds to replenish one attempt (default: 6)
//! - `LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use vitrine_api::ApiConfig;
use vitrine_core::{DEFAULT_SHIPPING, Money};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// REST API client settings
    pub api: ApiSettings,
    /// Flat shipping cost for non-empty carts
    pub shipping: Money,
    /// Login/register throttling
    pub auth_rate_limit: RateLimitSettings,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// REST API connection settings.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub read_retries: u32,
}

/// Token bucket for credential submissions.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    /// Attempts allowed back to back
    pub burst: u32,
    /// Seconds to replenish one attempt
    pub period_secs: u64,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api_url = env.required("VITRINE_API_URL")?;
        let api = ApiSettings {
            base_url: Url::parse(&api_url).map_err(|e| {
                ConfigError::InvalidEnvVar("VITRINE_API_URL".to_string(), e.to_string())
            })?,
            timeout: Duration::from_secs(env.parse_or("API_TIMEOUT_SECS", 10)?),
            cache_ttl: Duration::from_secs(env.parse_or("API_CACHE_TTL_SECS", 60)?),
            cache_capacity: env.parse_or("API_CACHE_CAPACITY", 1000)?,
            read_retries: env.parse_or("API_READ_RETRIES", 3)?,
        };

        let log_format = match env.optional("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected json or text, got {other}"),
                ));
            }
        };

        let auth_rate_limit = RateLimitSettings {
            burst: env.parse_or("AUTH_RATE_LIMIT_BURST", 5)?,
            period_secs: env.parse_or("AUTH_RATE_LIMIT_PERIOD_SECS", 6)?,
        };
        if auth_rate_limit.burst == 0 || auth_rate_limit.period_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "AUTH_RATE_LIMIT_BURST".to_string(),
                "burst and period must be positive".to_string(),
            ));
        }

        Ok(Self {
            host: env.parse_or("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parse_or("STOREFRONT_PORT", 3000)?,
            base_url: env.required("STOREFRONT_BASE_URL")?,
            api,
            shipping: env.parse_or("SHIPPING_COST", DEFAULT_SHIPPING)?,
            auth_rate_limit,
            log_format,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over TLS.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Settings for the REST API client.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::new(self.api.base_url.clone());
        config.timeout = self.api.timeout;
        config.cache_ttl = self.api.cache_ttl;
        config.cache_capacity = self.api.cache_capacity;
        config.read_retries = self.api.read_retries;
        config
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}
