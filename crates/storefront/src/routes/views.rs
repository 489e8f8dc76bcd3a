//! Display data for templates.
//!
//! Entities are flattened into pre-formatted strings so templates stay free
//! of logic.

use vitrine_core::{
    Address, CartItem, CartTotals, Category, Order, OrderItem, Product, Role, User,
};

/// Product tile in listings.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub href: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub in_stock: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            href: format!("/products/{}", urlencoding::encode(product.id.as_str())),
            name: product.name.clone(),
            price: product.price.display(),
            image: product.image.clone(),
            category: product.category.as_ref().map(|c| c.name.clone()),
            in_stock: product.in_stock(),
        }
    }
}

/// Category tile.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub href: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            href: format!("/categories/{}", urlencoding::encode(&category.slug)),
            description: category.description.clone().filter(|d| !d.is_empty()),
            image: category.image.clone(),
        }
    }
}

/// Line of the cart page.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: String,
    pub product_href: String,
    pub name: String,
    pub image: Option<String>,
    pub variant: Option<String>,
    pub quantity: u32,
    /// Upper bound for the quantity input; 0 when stock is unknown.
    pub max_quantity: u32,
    pub unit_price: String,
    pub total: String,
}

impl From<&CartItem> for CartLine {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_href: format!("/products/{}", urlencoding::encode(item.product.id.as_str())),
            name: item.product.name.clone(),
            image: item.product.image.clone(),
            variant: item.variant.as_ref().map(vitrine_core::Variant::label),
            quantity: item.quantity,
            max_quantity: item.max_quantity().unwrap_or(0),
            unit_price: item.unit_price().display(),
            total: item.line_total().display(),
        }
    }
}

/// Cart or checkout summary.
#[derive(Debug, Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub item_count: u32,
}

impl From<CartTotals> for TotalsView {
    fn from(totals: CartTotals) -> Self {
        Self {
            subtotal: totals.subtotal.display(),
            shipping: totals.shipping.display(),
            total: totals.total.display(),
            item_count: totals.item_count,
        }
    }
}

/// Order in a list.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub href: String,
    pub date: String,
    pub status: String,
    pub status_label: String,
    pub status_class: String,
    pub total: String,
    pub item_count: u32,
    pub customer: Option<String>,
    pub payment: Option<String>,
}

impl OrderRow {
    /// Row linking to `{base}/{id}`.
    #[must_use]
    pub fn new(order: &Order, base: &str) -> Self {
        Self {
            id: order.id.to_string(),
            href: format!("{base}/{}", urlencoding::encode(order.id.as_str())),
            date: order.created_on(),
            status: order.status.as_str().to_string(),
            status_label: order.status.label().to_string(),
            status_class: order.status.badge_class().to_string(),
            total: order.total.display(),
            item_count: order.item_count(),
            customer: order.user.as_ref().map(|u| format!("{} <{}>", u.name, u.email)),
            payment: order.payment.as_ref().map(|p| {
                format!("{} ({})", p.method.label(), p.status.label())
            }),
        }
    }
}

/// Line of an order detail.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub name: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub total: String,
}

impl From<&OrderItem> for OrderLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.product_name().to_string(),
            variant: item.variant.as_ref().map(vitrine_core::Variant::label),
            quantity: item.quantity,
            unit_price: item.price.display(),
            total: item.line_total().display(),
        }
    }
}

/// Saved address.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: String,
    pub line: String,
    pub is_default: bool,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id.to_string(),
            line: address.one_line(),
            is_default: address.is_default,
        }
    }
}

/// User in the back-office.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub role_label: String,
    pub is_admin: bool,
    pub since: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.as_str().to_string(),
            role_label: user.role.label().to_string(),
            is_admin: user.role == Role::Admin,
            since: user
                .created_at
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_default(),
        }
    }
}

/// `<option>` of a select.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

/// Trimmed form value, `None` when blank.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_card() {
        let product: Product = serde_json::from_str(
            r#"{"id": "p 1", "name": "Blusa", "price": "79.9",
                "variants": [{"id": 1, "size": "M", "stock": 0}]}"#,
        )
        .unwrap();
        let card = ProductCard::from(&product);
        assert_eq!(card.href, "/products/p%201");
        assert_eq!(card.price, "R$ 79,90");
        assert!(!card.in_stock);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
