//! The signed-in customer's shipping addresses.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{Address, AddressId};

use super::segment;
use crate::cache::Resource;
use crate::client::Api;
use crate::error::ApiError;

/// `/auth/me` embeds the address list.
const ADDRESS_DEPENDENTS: &[Resource] = &[Resource::Addresses, Resource::Profile];

/// Address create/update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub street: String,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub is_default: bool,
}

impl Api {
    /// Saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error without a credential or if the request fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        self.require_caller()?;
        self.read_cached(Resource::Addresses, "", "/addresses", &[])
            .await
    }

    /// Save a new address and return it with its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the address or the call fails.
    #[instrument(skip_all, fields(city = %input.city))]
    pub async fn create_address(&self, input: &AddressInput) -> Result<Address, ApiError> {
        self.require_caller()?;
        self.write(Method::POST, "/addresses", Some(input), ADDRESS_DEPENDENTS)
            .await
    }

    /// Replace an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the change or the call fails.
    #[instrument(skip(self, input), fields(address_id = %id))]
    pub async fn update_address(&self, id: &AddressId, input: &AddressInput) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::PUT,
            &format!("/addresses/{}", segment(id.as_str())),
            Some(input),
            ADDRESS_DEPENDENTS,
        )
        .await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&self, id: &AddressId) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::DELETE,
            &format!("/addresses/{}", segment(id.as_str())),
            None::<&()>,
            ADDRESS_DEPENDENTS,
        )
        .await
    }
}
