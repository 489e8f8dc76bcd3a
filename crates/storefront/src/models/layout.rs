//! Data every page layout needs: who is signed in and the pending toast.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::{CurrentSession, Flash};
use crate::middleware::session_store;

/// Header and toast data for the base templates.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// First name of the signed-in visitor.
    pub user_name: Option<String>,
    pub is_admin: bool,
    pub flash: Option<Flash>,
    /// Current path, for highlighting navigation.
    pub path: String,
}

impl Layout {
    #[must_use]
    pub fn new(session: Option<&CurrentSession>, flash: Option<Flash>) -> Self {
        Self {
            user_name: session.map(|s| s.user.first_name().to_string()),
            is_admin: session.is_some_and(CurrentSession::is_admin),
            flash,
            path: String::new(),
        }
    }

    /// Whether `prefix` is the active navigation section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" || prefix == "/admin" {
            self.path == prefix
        } else {
            self.path.starts_with(prefix)
        }
    }
}

/// Extracts the layout, consuming the pending flash message.
impl<S> FromRequestParts<S> for Layout
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self {
                path,
                ..Self::default()
            });
        };

        let current = session_store::current(parts, &session).await;
        let flash = session_store::take_flash(&session).await;
        Ok(Self {
            path,
            ..Self::new(current.as_ref(), flash)
        })
    }
}
