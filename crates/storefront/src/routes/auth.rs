//! Login, registration and logout.
//!
//! Successful logins store the API's token and user record in the session;
//! the role in that record drives every route gate afterwards.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use vitrine_api::{AuthSession, Credentials, Registration};
use vitrine_core::validation::{self, ValidationError};

use super::views::non_blank;
use crate::error::{Result, form_error};
use crate::filters;
use crate::middleware::{OptionalSession, PublicOnly};
use crate::middleware::auth::LOGIN_PATH;
use crate::middleware::session_store::{clear_session, set_flash, store_session};
use crate::models::{Flash, Layout};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "E-mail ou senha inválidos.";

// =============================================================================
// Login
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Display the login page.
pub async fn login_page(_: PublicOnly, layout: Layout) -> LoginTemplate {
    LoginTemplate {
        layout,
        email: String::new(),
        error: None,
    }
}

/// Exchange credentials for a session.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    _: PublicOnly,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let rerender = |error: &str| {
        LoginTemplate {
            layout: layout.clone(),
            email: form.email.clone(),
            error: Some(error.to_string()),
        }
        .into_response()
    };

    if let Err(e) = validation::validate_email(&form.email) {
        return Ok(rerender(&e.to_string()));
    }
    if form.password.is_empty() {
        return Ok(rerender(&ValidationError::Required("senha").to_string()));
    }

    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };
    match state.api().login(&credentials).await {
        Ok(auth) => sign_in(&session, &auth).await,
        Err(e) if e.is_unauthorized() => Ok(rerender(INVALID_CREDENTIALS)),
        Err(e) => Ok(rerender(&form_error(e)?)),
    }
}

async fn sign_in(session: &Session, auth: &AuthSession) -> Result<Response> {
    store_session(session, auth).await?;
    tracing::info!(user_id = %auth.user.id, role = %auth.user.role, "Signed in");
    set_flash(
        session,
        Flash::success(format!("Olá, {}!", auth.user.first_name())),
    )
    .await?;
    let target = if auth.user.is_admin() { "/admin" } else { "/" };
    Ok(Redirect::to(target).into_response())
}

// =============================================================================
// Registration
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub error: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl RegisterForm {
    /// Local checks; nothing is sent to the API when they fail.
    fn to_registration(&self) -> std::result::Result<Registration, ValidationError> {
        validation::require_name(&self.name)?;
        validation::validate_email(&self.email)?;
        validation::validate_new_password(&self.password, &self.password_confirmation)?;
        Ok(Registration {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            phone: non_blank(self.phone.as_deref()),
        })
    }
}

/// Display the registration page.
pub async fn register_page(_: PublicOnly, layout: Layout) -> RegisterTemplate {
    RegisterTemplate {
        layout,
        name: String::new(),
        email: String::new(),
        phone: String::new(),
        error: None,
    }
}

/// Create an account and sign in.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn register(
    _: PublicOnly,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let rerender = |error: String| {
        RegisterTemplate {
            layout: layout.clone(),
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone().unwrap_or_default(),
            error: Some(error),
        }
        .into_response()
    };

    let registration = match form.to_registration() {
        Ok(registration) => registration,
        Err(e) => return Ok(rerender(e.to_string())),
    };

    match state.api().register(&registration).await {
        Ok(auth) => sign_in(&session, &auth).await,
        Err(e) => Ok(rerender(form_error(e)?)),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Forget the credential and the reads cached with it. No revocation call
/// is made.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalSession(current): OptionalSession,
    session: Session,
) -> Result<Redirect> {
    if let Some(current) = &current {
        state.api_as(current).forget_cached_reads();
    }
    clear_session(&session).await?;
    Ok(Redirect::to(LOGIN_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str, confirmation: &str) -> RegisterForm {
        RegisterForm {
            name: "Rita".into(),
            email: "rita@example.com".into(),
            password: password.into(),
            password_confirmation: confirmation.into(),
            ..RegisterForm::default()
        }
    }

    #[test]
    fn test_registration_checks() {
        assert_eq!(
            form("segredo1", "segredo2").to_registration().unwrap_err(),
            ValidationError::PasswordMismatch
        );
        assert_eq!(
            form("abc", "abc").to_registration().unwrap_err(),
            ValidationError::PasswordTooShort
        );
        let registration = form("segredo1", "segredo1").to_registration().unwrap();
        assert!(registration.phone.is_none());
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", form("segredo1", "segredo1"));
        assert!(!debug.contains("segredo1"));
    }
}
