//! Login, registration and the signed-in user's profile.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrine_core::User;

use crate::cache::Resource;
use crate::client::Api;
use crate::error::ApiError;

/// Login form.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration form.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Profile changes made by the signed-in user.
#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("name", &self.name)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Answer to a successful login or registration.
#[derive(Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user.id)
            .finish()
    }
}

/// A user record, bare or wrapped as `{ "user": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: User },
    Bare(User),
}

impl From<UserEnvelope> for User {
    fn from(envelope: UserEnvelope) -> Self {
        match envelope {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user,
        }
    }
}

impl Api {
    /// Exchange credentials for a bearer token and user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the call fails.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        self.write(Method::POST, "/auth/login", Some(credentials), &[])
            .await
    }

    /// Create an account; the API signs the new user in.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the registration or the call fails.
    #[instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<AuthSession, ApiError> {
        self.write(Method::POST, "/auth/register", Some(registration), &[])
            .await
    }

    /// The signed-in user's current record.
    ///
    /// # Errors
    ///
    /// Returns an error without a credential or if the call fails.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        self.require_caller()?;
        self.read_cached(Resource::Profile, "", "/auth/me", &[])
            .await
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error without a credential or if the call fails.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        self.require_caller()?;
        let envelope: UserEnvelope = self
            .write(
                Method::PUT,
                "/auth/profile",
                Some(update),
                &[Resource::Profile, Resource::Users],
            )
            .await?;
        Ok(envelope.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_session_shape() {
        let session: AuthSession = serde_json::from_str(
            r#"{"token":"abc","user":{"id":1,"name":"Ana","email":"ana@x.com","role":"admin"}}"#,
        )
        .unwrap();
        assert_eq!(session.token, "abc");
        assert!(session.user.is_admin());
        assert!(!format!("{session:?}").contains("abc"));
    }

    #[test]
    fn test_user_envelope_forms() {
        let wrapped: UserEnvelope =
            serde_json::from_str(r#"{"user":{"id":"u1","name":"Bia","email":"b@x.com"}}"#).unwrap();
        let bare: UserEnvelope =
            serde_json::from_str(r#"{"id":"u1","name":"Bia","email":"b@x.com"}"#).unwrap();
        assert_eq!(User::from(wrapped), User::from(bare));
    }

    #[test]
    fn test_profile_update_omits_empty_fields() {
        let update = ProfileUpdate {
            name: "Bia".into(),
            ..ProfileUpdate::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"name":"Bia"}"#);
    }
}
