//! The signed-in customer's cart.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{Cart, CartItemId, ProductId, VariantId};

use super::segment;
use crate::cache::Resource;
use crate::client::Api;
use crate::error::ApiError;

/// Add-to-cart payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

#[derive(Serialize)]
struct QuantityChange {
    quantity: u32,
}

impl Api {
    /// The current cart.
    ///
    /// # Errors
    ///
    /// Returns an error without a credential or if the request fails.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<Cart, ApiError> {
        self.require_caller()?;
        self.read_cached(Resource::Cart, "", "/cart", &[]).await
    }

    /// Add a product (variant) to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the item (e.g. out of stock) or
    /// the call fails.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, input: &CartItemInput) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(Method::POST, "/cart/items", Some(input), &[Resource::Cart])
            .await
    }

    /// Change the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the change or the call fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn update_cart_item(&self, id: &CartItemId, quantity: u32) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::PUT,
            &format!("/cart/items/{}", segment(id.as_str())),
            Some(&QuantityChange { quantity }),
            &[Resource::Cart],
        )
        .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn remove_cart_item(&self, id: &CartItemId) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::DELETE,
            &format!("/cart/items/{}", segment(id.as_str())),
            None::<&()>,
            &[Resource::Cart],
        )
        .await
    }
}
