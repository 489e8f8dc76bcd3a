//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Rejected-session cleanup
//! 7. Error page layout (`crate::error::error_page_layout`)
//!
//! Login and registration submissions additionally pass through the
//! rate limiter.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_store;

pub use auth::{GateRejection, OptionalSession, PublicOnly, RequireAdmin, RequireSession};
pub use rate_limit::{RateLimiterLayer, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use session_store::{SessionRejected, clear_rejected_session};
