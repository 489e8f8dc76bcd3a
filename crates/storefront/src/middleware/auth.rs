//! Route gates.
//!
//! Each gate is an extractor that either hands the handler the visitor's
//! session or answers with a redirect. They never call the API: the role is
//! read from the user record stored at login.
//!
//! ```rust,ignore
//! async fn orders(RequireSession(current): RequireSession) -> impl IntoResponse {
//!     format!("Hello, {}!", current.user.first_name())
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::session_store;
use crate::models::CurrentSession;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login";

/// Where signed-in visitors land.
pub const HOME_PATH: &str = "/";

/// Redirect issued by a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// No session: go sign in.
    RedirectToLogin,
    /// Signed in but not allowed here, or already signed in.
    RedirectToHome,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::RedirectToHome => Redirect::to(HOME_PATH).into_response(),
        }
    }
}

async fn load(parts: &mut Parts) -> Option<CurrentSession> {
    let session = parts.extensions.get::<Session>().cloned()?;
    session_store::current(parts, &session).await
}

/// Requires a signed-in visitor.
pub struct RequireSession(pub CurrentSession);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        load(parts)
            .await
            .map(Self)
            .ok_or(GateRejection::RedirectToLogin)
    }
}

/// Requires a signed-in administrator.
///
/// Anonymous visitors go to the login page; signed-in customers go home.
pub struct RequireAdmin(pub CurrentSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match load(parts).await {
            Some(current) if current.is_admin() => Ok(Self(current)),
            Some(current) => {
                tracing::debug!(user_id = %current.user.id, "Non-admin turned away from back-office");
                Err(GateRejection::RedirectToHome)
            }
            None => Err(GateRejection::RedirectToLogin),
        }
    }
}

/// Only for visitors who are not signed in (login and registration).
pub struct PublicOnly;

impl<S> FromRequestParts<S> for PublicOnly
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match load(parts).await {
            Some(_) => Err(GateRejection::RedirectToHome),
            None => Ok(Self),
        }
    }
}

/// The visitor's session, if any. Never rejects.
pub struct OptionalSession(pub Option<CurrentSession>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(load(parts).await))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, StatusCode, header::LOCATION};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::session_keys;

    async fn parts_with(role: Option<&str>) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(role) = role {
            session.insert(session_keys::TOKEN, "opaque").await.unwrap();
            session
                .insert(
                    session_keys::USER,
                    serde_json::json!({"id": 1, "name": "Caio", "email": "c@x.com", "role": role}),
                )
                .await
                .unwrap();
        }
        let (mut parts, ()) = Request::builder().uri("/x").body(()).unwrap().into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn location(rejection: GateRejection) -> String {
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response.headers()[LOCATION].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_require_session() {
        let mut anon = parts_with(None).await;
        let rejection = RequireSession::from_request_parts(&mut anon, &())
            .await
            .err()
            .unwrap();
        assert_eq!(location(rejection), "/login");

        let mut signed_in = parts_with(Some("CUSTOMER")).await;
        assert!(RequireSession::from_request_parts(&mut signed_in, &()).await.is_ok());
    }

    #[tokio::test]
    async fn test_require_admin_distinguishes_customer_from_anonymous() {
        let mut customer = parts_with(Some("CUSTOMER")).await;
        let rejection = RequireAdmin::from_request_parts(&mut customer, &())
            .await
            .err()
            .unwrap();
        assert_eq!(location(rejection), "/");

        let mut anon = parts_with(None).await;
        let rejection = RequireAdmin::from_request_parts(&mut anon, &())
            .await
            .err()
            .unwrap();
        assert_eq!(location(rejection), "/login");

        let mut admin = parts_with(Some("ADMIN")).await;
        let RequireAdmin(current) = RequireAdmin::from_request_parts(&mut admin, &())
            .await
            .ok()
            .unwrap();
        assert!(current.is_admin());
    }

    #[tokio::test]
    async fn test_public_only() {
        let mut signed_in = parts_with(Some("CUSTOMER")).await;
        let rejection = PublicOnly::from_request_parts(&mut signed_in, &())
            .await
            .err()
            .unwrap();
        assert_eq!(location(rejection), "/");

        let mut anon = parts_with(None).await;
        assert!(PublicOnly::from_request_parts(&mut anon, &()).await.is_ok());
    }

    #[tokio::test]
    async fn test_optional_session_never_rejects() {
        let mut anon = parts_with(None).await;
        let OptionalSession(current) = OptionalSession::from_request_parts(&mut anon, &())
            .await
            .unwrap();
        assert!(current.is_none());
    }
}
