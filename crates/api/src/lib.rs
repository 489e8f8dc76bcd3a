//! Vitrine API - access to the retailer's REST API.
//!
//! All persistence, payment, inventory and authentication happen behind the
//! REST API; this crate is the only place that talks to it.
//!
//! # Architecture
//!
//! - [`ApiClient`] wraps one `reqwest::Client` and the shared read cache
//! - [`Api`] is a per-visitor handle that attaches the bearer token
//! - [`cache`] keys reads by resource, scope and query parameters (`moka`,
//!   60 second TTL by default) and drops them when a mutation succeeds
//! - [`resources`] adds one group of methods per resource
//!
//! # Example
//!
//! ```rust,ignore
//! use vitrine_api::{ApiClient, ApiConfig, Caller};
//!
//! let client = ApiClient::new(&ApiConfig::new(base_url))?;
//!
//! // Anonymous catalog read (cached)
//! let categories = client.anonymous().categories().await?;
//!
//! // Authenticated read, cached under the user's own scope
//! let api = client.as_caller(Caller::new(user.id.clone(), token));
//! let cart = api.cart().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
mod client;
mod error;
pub mod resources;

pub use cache::{CacheKey, Resource, ResourceCache, Scope};
pub use client::{Api, ApiClient, ApiConfig, Caller};
pub use error::{ApiError, GENERIC_MESSAGE};
pub use resources::*;
