//! Catalog entities: categories, products and their variants.

use serde::{Deserialize, Deserializer, Serialize};

use super::id::{CategoryId, ProductId, VariantId};
use super::price::Money;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Category summary embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A size/color/stock combination of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

impl Variant {
    /// Whether at least one unit is in stock.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// `M / Azul` style label.
    #[must_use]
    pub fn label(&self) -> String {
        match self.color.as_deref().filter(|c| !c.is_empty()) {
            Some(color) => format!("{} / {color}", self.size),
            None => self.size.clone(),
        }
    }
}

/// A product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    #[serde(default = "default_active", alias = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// Distinct sizes with stock, in variant order.
    #[must_use]
    pub fn available_sizes(&self) -> Vec<&str> {
        let mut sizes: Vec<&str> = Vec::new();
        for variant in self.variants.iter().filter(|v| v.in_stock()) {
            if !sizes.contains(&variant.size.as_str()) {
                sizes.push(variant.size.as_str());
            }
        }
        sizes
    }

    /// Variants that can be added to a cart.
    pub fn purchasable_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|v| v.in_stock())
    }

    /// Units in stock across all variants.
    #[must_use]
    pub fn total_stock(&self) -> i64 {
        self.variants.iter().map(|v| i64::from(v.stock.max(0))).sum()
    }

    /// Whether any variant has stock.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.variants.iter().any(Variant::in_stock)
    }

    /// Find a variant by id.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Slug of the embedded category, if the API included it.
    #[must_use]
    pub fn category_slug(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.slug.as_str())
    }

    /// Case-insensitive match of `term` against name and description.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term) || self.description.to_lowercase().contains(&term)
    }
}

/// Keep the products in `category_slug` that match `search`.
///
/// Either filter may be absent. Storefront listings pass only active
/// products; the back-office sees everything.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [Product],
    category_slug: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| match category_slug.filter(|s| !s.is_empty()) {
            Some(slug) => p.category_slug() == Some(slug),
            None => true,
        })
        .filter(|p| search.is_none_or(|term| p.matches_search(term)))
        .collect()
}

/// Pagination metadata of a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub total_pages: u32,
}

const fn first_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 0,
            total: 0,
            total_pages: 1,
        }
    }
}

/// A page of products.
///
/// The API answers `{ "products": [...], "pagination": {...} }`; a bare array
/// is accepted as a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

impl<'de> Deserialize<'de> for ProductPage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Wrapped {
                products: Vec<Product>,
                #[serde(default)]
                pagination: Option<Pagination>,
            },
            Bare(Vec<Product>),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Wrapped {
                products,
                pagination,
            } => {
                let pagination = pagination.unwrap_or(Pagination {
                    total: products.len() as u64,
                    ..Pagination::default()
                });
                Self {
                    products,
                    pagination,
                }
            }
            Wire::Bare(products) => Self {
                pagination: Pagination {
                    total: products.len() as u64,
                    ..Pagination::default()
                },
                products,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(json: &str) -> Product {
        serde_json::from_str(json).unwrap()
    }

    fn sample() -> Product {
        product(
            r#"{
                "id": 1,
                "name": "Vestido Midi Floral",
                "description": "Viscose leve",
                "price": 189.9,
                "imageUrl": "/uploads/vestido.jpg",
                "category": {"id": 3, "name": "Vestidos", "slug": "vestidos"},
                "variants": [
                    {"id": 10, "size": "P", "color": "Azul", "stock": 0},
                    {"id": 11, "size": "M", "color": "Azul", "stock": 2},
                    {"id": 12, "size": "M", "color": "Rosa", "stock": 1},
                    {"id": 13, "size": "G", "stock": 5}
                ]
            }"#,
        )
    }

    #[test]
    fn test_available_sizes_skip_out_of_stock_and_dedupe() {
        let p = sample();
        assert_eq!(p.available_sizes(), vec!["M", "G"]);
        assert!(p.in_stock());
        assert_eq!(p.total_stock(), 8);
    }

    #[test]
    fn test_product_defaults() {
        let p = sample();
        assert!(p.is_active);
        assert_eq!(p.image.as_deref(), Some("/uploads/vestido.jpg"));
        assert_eq!(p.category_slug(), Some("vestidos"));
    }

    #[test]
    fn test_inactive_alias() {
        let p = product(r#"{"id": "a", "name": "Saia", "price": "59.90", "active": false}"#);
        assert!(!p.is_active);
        assert!(!p.in_stock());
        assert!(p.available_sizes().is_empty());
    }

    #[test]
    fn test_filter_products_by_category_and_search() {
        let dress = sample();
        let skirt = product(
            r#"{"id": 2, "name": "Saia Jeans", "price": 99,
                "category": {"id": 4, "name": "Saias", "slug": "saias"}}"#,
        );
        let products = vec![dress, skirt];

        let by_category = filter_products(&products, Some("saias"), None);
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].name, "Saia Jeans");

        let by_search = filter_products(&products, None, Some("VISCOSE"));
        assert_eq!(by_search.len(), 1);
        assert_eq!(by_search[0].name, "Vestido Midi Floral");

        assert_eq!(filter_products(&products, Some(""), Some("  ")).len(), 2);
        assert!(filter_products(&products, Some("saias"), Some("floral")).is_empty());
    }

    #[test]
    fn test_product_page_wrapped_and_bare() {
        let wrapped: ProductPage = serde_json::from_str(
            r#"{"products": [{"id": 1, "name": "A", "price": 10}],
                "pagination": {"page": 2, "limit": 12, "total": 13, "totalPages": 2}}"#,
        )
        .unwrap();
        assert_eq!(wrapped.products.len(), 1);
        assert_eq!(wrapped.pagination.page, 2);
        assert_eq!(wrapped.pagination.total_pages, 2);

        let bare: ProductPage =
            serde_json::from_str(r#"[{"id": 1, "name": "A", "price": 10}]"#).unwrap();
        assert_eq!(bare.pagination.total, 1);
        assert_eq!(bare.pagination.total_pages, 1);
    }

    #[test]
    fn test_variant_label() {
        let p = sample();
        assert_eq!(p.variants[1].label(), "M / Azul");
        assert_eq!(p.variants[3].label(), "G");
    }
}
