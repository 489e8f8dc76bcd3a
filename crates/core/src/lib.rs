//! Vitrine Core - Shared domain types.
//!
//! This crate provides the types used across all Vitrine components:
//! - `api` - Client for the retailer's REST API
//! - `storefront` - Public shop and `/admin` back-office
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Entities mirror the JSON the REST API returns; the API is the
//! source of truth for every invariant.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, roles, order status and the API entities
//! - [`slug`] - URL slug derivation for categories
//! - [`token`] - Best-effort decoding of a bearer token's expiry claim
//! - [`validation`] - Presence/format checks run before form submission
//! - [`query`] - Product listing filters and their query-string form

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod query;
pub mod slug;
pub mod token;
pub mod types;
pub mod validation;

pub use query::ProductQuery;
pub use slug::slugify;
pub use token::{TokenClaims, TokenError};
pub use types::*;
pub use validation::ValidationError;
