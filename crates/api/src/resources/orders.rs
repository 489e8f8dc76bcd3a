//! Orders, for customers and the back-office.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{AddressId, Order, OrderId, OrderStatus, PaymentMethod};

use super::segment;
use crate::cache::Resource;
use crate::client::Api;
use crate::error::ApiError;

/// Checkout payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
}

#[derive(Serialize)]
struct StatusChange {
    status: OrderStatus,
}

impl Api {
    /// The signed-in customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error without a credential or if the request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.require_caller()?;
        self.read_cached(Resource::Orders, "mine", "/orders", &[])
            .await
    }

    /// One order. Customers only see their own; administrators see any.
    ///
    /// # Errors
    ///
    /// Returns an error without a credential, if the order is not visible,
    /// or if the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.require_caller()?;
        self.read_cached(
            Resource::Orders,
            format!("id={id}"),
            &format!("/orders/{}", segment(id.as_str())),
            &[],
        )
        .await
    }

    /// Every order, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns an error without an administrator credential or if the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn all_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
        self.require_caller()?;
        let query: Vec<(&'static str, String)> = status
            .map(|s| vec![("status", s.as_str().to_string())])
            .unwrap_or_default();
        self.read_cached(
            Resource::Orders,
            format!("admin?status={}", status.map_or("", OrderStatus::as_str)),
            "/orders/admin/all",
            &query,
        )
        .await
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the order or the call fails.
    #[instrument(skip_all, fields(payment = %input.payment_method.as_str()))]
    pub async fn create_order(&self, input: &OrderInput) -> Result<Order, ApiError> {
        self.require_caller()?;
        self.write(
            Method::POST,
            "/orders",
            Some(input),
            &[Resource::Orders, Resource::Cart, Resource::Products],
        )
        .await
    }

    /// Move an order to `status`. Transitions are validated by the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the change or the call fails.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::PATCH,
            &format!("/orders/admin/{}/status", segment(id.as_str())),
            Some(&StatusChange { status }),
            &[Resource::Orders],
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_input_wire_shape() {
        let input = OrderInput {
            address_id: "12".into(),
            payment_method: PaymentMethod::CreditCard,
        };
        assert_eq!(
            serde_json::to_string(&input).unwrap(),
            r#"{"addressId":"12","paymentMethod":"CREDIT_CARD"}"#
        );
    }

    #[test]
    fn test_status_change_wire_shape() {
        let body = StatusChange {
            status: OrderStatus::Shipped,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"status":"SHIPPED"}"#);
    }
}
