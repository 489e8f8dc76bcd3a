//! Product listing filters.
//!
//! A [`ProductQuery`] is parsed from the storefront's own query string and
//! forwarded to `GET /products` as `categorySlug`, `minPrice`, `maxPrice`,
//! `inStock`, `search`, `limit` and `page`. Its [`ProductQuery::cache_key`]
//! identifies the listing in the resource cache, so two queries with the same
//! effective filters share one entry.

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Filters for a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ProductQuery {
    /// Query restricted to one category.
    #[must_use]
    pub fn for_category(slug: impl Into<String>) -> Self {
        Self {
            category_slug: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Drop blank strings and zero pages so equivalent queries compare equal.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }
        self.category_slug = clean(self.category_slug);
        self.search = clean(self.search);
        self.page = self.page.filter(|p| *p > 0);
        self.limit = self.limit.filter(|l| *l > 0);
        self
    }

    /// Whether any filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Name/value pairs for the API request, in a fixed order.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(slug) = &self.category_slug {
            pairs.push(("categorySlug", slug.clone()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("minPrice", min.to_form_value()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("maxPrice", max.to_form_value()));
        }
        if let Some(in_stock) = self.in_stock {
            pairs.push(("inStock", in_stock.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }

    /// Stable cache key for these filters, e.g.
    /// `categorySlug=vestidos&page=2`. Empty when no filter is set.
    ///
    /// Values are percent-encoded so a `&` or `=` inside a filter cannot
    /// forge another filter set's key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.to_query_pairs()
            .into_iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
