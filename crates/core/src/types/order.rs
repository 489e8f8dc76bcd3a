//! Orders and payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::Variant;
use super::id::{OrderId, ProductId, UserId};
use super::price::Money;
use super::status::{OrderStatus, PaymentStatus};
use super::user::Address;

/// Payment methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "pix")]
    Pix,
    #[serde(alias = "credit_card", alias = "CARD")]
    CreditCard,
    #[serde(alias = "boleto")]
    Boleto,
}

impl PaymentMethod {
    /// Every method, in the order shown at checkout.
    pub const ALL: [Self; 3] = [Self::Pix, Self::CreditCard, Self::Boleto];

    /// Portuguese label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pix => "Pix",
            Self::CreditCard => "Cartão de crédito",
            Self::Boleto => "Boleto bancário",
        }
    }

    /// Wire value, also used as the form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::CreditCard => "CREDIT_CARD",
            Self::Boleto => "BOLETO",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PIX" => Ok(Self::Pix),
            "CREDIT_CARD" | "CARD" => Ok(Self::CreditCard),
            "BOLETO" => Ok(Self::Boleto),
            other => Err(format!("invalid payment method: {other}")),
        }
    }
}

/// Payment attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
}

/// Product summary embedded in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A line of an order, priced at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<OrderProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    pub quantity: u32,
    pub price: Money,
}

impl OrderItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }

    /// Product name, or a placeholder when the product was deleted.
    #[must_use]
    pub fn product_name(&self) -> &str {
        self.product
            .as_ref()
            .map_or("Produto removido", |p| p.name.as_str())
    }
}

/// Customer summary embedded in admin order listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// An order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    pub total: Money,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderCustomer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// `dd/mm/yyyy` creation date, empty when unknown.
    #[must_use]
    pub fn created_on(&self) -> String {
        self.created_at
            .map(|at| at.format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }
}
