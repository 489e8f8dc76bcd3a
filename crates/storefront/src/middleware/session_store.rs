//! The only reader and writer of the credential keys in the session.
//!
//! Loading is lenient: a missing key, a record that no longer deserializes or
//! a token whose `exp` claim has passed all mean "no session", and nothing is
//! surfaced to the visitor.

use axum::{
    extract::Request,
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::{debug, warn};

use vitrine_api::AuthSession;
use vitrine_core::{User, token};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentSession, Flash, session_keys};

/// Marker placed on a response when the API rejected the visitor's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionRejected;

/// Per-request memo of the loaded session.
#[derive(Clone)]
struct Loaded(Option<CurrentSession>);

/// Read the credential pair from the session.
///
/// Stale keys of an expired token are removed.
pub async fn load_session(session: &Session) -> Option<CurrentSession> {
    let token = session
        .get::<String>(session_keys::TOKEN)
        .await
        .ok()
        .flatten()?;
    let user = match session.get::<User>(session_keys::USER).await {
        Ok(Some(user)) => user,
        Ok(None) => return None,
        Err(e) => {
            debug!(error = %e, "Ignoring unreadable session user");
            return None;
        }
    };

    if token::is_expired(&token, Utc::now()) {
        debug!(user_id = %user.id, "Session token expired");
        if let Err(e) = remove_credentials(session).await {
            warn!(error = %e, "Failed to remove expired credentials");
        }
        return None;
    }

    Some(CurrentSession::new(user, token))
}

/// Load the session once per request and tag the Sentry scope with the user.
pub async fn current(parts: &mut Parts, session: &Session) -> Option<CurrentSession> {
    if let Some(Loaded(current)) = parts.extensions.get::<Loaded>() {
        return current.clone();
    }
    let current = load_session(session).await;
    if let Some(c) = &current {
        set_sentry_user(&c.user.id, Some(&c.user.email));
    }
    parts.extensions.insert(Loaded(current.clone()));
    current
}

/// Persist a fresh login.
///
/// The session id is rotated before the credentials are written.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::TOKEN, &auth.token).await?;
    session.insert(session_keys::USER, &auth.user).await?;
    set_sentry_user(&auth.user.id, Some(&auth.user.email));
    Ok(())
}

/// Replace the stored user record after a profile change.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn update_user(session: &Session, user: &User) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER, user).await
}

/// Drop every piece of session state (logout).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    clear_sentry_user();
    session.flush().await
}

async fn remove_credentials(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove_value(session_keys::TOKEN).await?;
    session.remove_value(session_keys::USER).await?;
    Ok(())
}

/// Queue a toast for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
}

/// Take the pending toast, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

/// Flush the session when a handler reports that the API rejected the token.
pub async fn clear_rejected_session(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let response = next.run(request).await;

    if response.extensions().get::<SessionRejected>().is_some() {
        if let Some(session) = session {
            debug!("API rejected the bearer token, clearing session");
            if let Err(e) = clear_session(&session).await {
                warn!(error = %e, "Failed to clear rejected session");
            }
        }
    }
    response
}
