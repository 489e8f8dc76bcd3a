//! Shopping cart and display totals.
//!
//! The API computes the authoritative cart total. The application recomputes
//! subtotals from the fetched lines for display and adds the flat shipping
//! cost.

use serde::{Deserialize, Deserializer, Serialize};

use super::catalog::{Product, Variant};
use super::id::CartItemId;
use super::price::Money;

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    pub quantity: u32,
}

impl CartItem {
    /// Price of one unit.
    #[must_use]
    pub const fn unit_price(&self) -> Money {
        self.product.price
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }

    /// Stock of the chosen variant, when known.
    #[must_use]
    pub fn max_quantity(&self) -> Option<u32> {
        self.variant
            .as_ref()
            .map(|v| u32::try_from(v.stock).unwrap_or(0))
    }
}

/// The visitor's cart.
///
/// The API answers `{ "items": [...], "total": 145.0 }`; a bare array of
/// items is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    /// Total as computed by the API.
    pub total: Option<Money>,
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Wrapped {
                #[serde(default)]
                items: Vec<CartItem>,
                #[serde(default)]
                total: Option<Money>,
            },
            Bare(Vec<CartItem>),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Wrapped { items, total } => Self { items, total },
            Wire::Bare(items) => Self { items, total: None },
        })
    }
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Display totals with the given flat shipping cost.
    #[must_use]
    pub fn totals(&self, shipping: Money) -> CartTotals {
        CartTotals::compute(&self.items, shipping)
    }
}

/// Subtotal, shipping and total shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub item_count: u32,
}

impl CartTotals {
    /// Sum `unit price x quantity` over `items`; shipping applies only to a
    /// non-empty cart.
    #[must_use]
    pub fn compute(items: &[CartItem], shipping: Money) -> Self {
        let subtotal: Money = items.iter().map(CartItem::line_total).sum();
        let shipping = if items.is_empty() {
            Money::ZERO
        } else {
            shipping
        };
        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
            item_count: items.iter().map(|i| i.quantity).sum(),
        }
    }
}
