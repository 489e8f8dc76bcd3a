//! User accounts (back-office).

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{Role, User, UserId};

use super::segment;
use crate::cache::Resource;
use crate::client::Api;
use crate::error::ApiError;

/// User create/update payload.
///
/// `password` is required on creation and optional on update, where leaving
/// it out keeps the current password.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for UserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl Api {
    /// Every user account.
    ///
    /// # Errors
    ///
    /// Returns an error without an administrator credential or if the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.require_caller()?;
        self.read_cached(Resource::Users, "", "/users", &[]).await
    }

    /// A single user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn user(&self, id: &UserId) -> Result<User, ApiError> {
        self.require_caller()?;
        self.read_cached(
            Resource::Users,
            format!("id={id}"),
            &format!("/users/{}", segment(id.as_str())),
            &[],
        )
        .await
    }

    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the account or the call fails.
    #[instrument(skip_all, fields(email = %input.email))]
    pub async fn create_user(&self, input: &UserInput) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(Method::POST, "/users", Some(input), &[Resource::Users])
            .await
    }

    /// Update a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the change or the call fails.
    #[instrument(skip(self, input), fields(user_id = %id))]
    pub async fn update_user(&self, id: &UserId, input: &UserInput) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::PUT,
            &format!("/users/{}", segment(id.as_str())),
            Some(input),
            &[Resource::Users, Resource::Profile],
        )
        .await
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the deletion or the call fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
        self.require_caller()?;
        self.write_discard(
            Method::DELETE,
            &format!("/users/{}", segment(id.as_str())),
            None::<&()>,
            &[Resource::Users, Resource::Profile],
        )
        .await
    }
}
