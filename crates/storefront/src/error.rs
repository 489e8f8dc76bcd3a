//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. API failures are translated
//! for the visitor: a rejected token ends the session, a missing entity
//! renders the not-found page, and anything server-side renders a generic
//! page after being captured to Sentry.

use askama::Template;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tower_sessions::Session;

use vitrine_api::{ApiError, GENERIC_MESSAGE};

use crate::filters;
use crate::middleware::SessionRejected;
use crate::middleware::auth::LOGIN_PATH;
use crate::middleware::session_store;
use crate::models::Layout;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A call to the REST API failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error is our fault (or the API's) rather than the
    /// visitor's.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Api(e) => !e.is_client_error(),
            Self::Session(_) | Self::Template(_) => true,
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Api(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Api(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown on the error page. Internal details never leak.
    fn public_message(&self) -> String {
        match self {
            Self::Api(e) if e.is_not_found() => NOT_FOUND_MESSAGE.to_string(),
            Self::Api(e) => e.user_message(),
            Self::NotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::Session(_) | Self::Template(_) => GENERIC_MESSAGE.to_string(),
        }
    }
}

const NOT_FOUND_MESSAGE: &str = "A página que você procura não existe ou foi removida.";

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    layout: Layout,
    status: u16,
    title: &'static str,
    message: &'a str,
}

/// Contents of an error page, kept on the response so
/// [`error_page_layout`] can render it again with the visitor's header.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    status: StatusCode,
    title: &'static str,
    message: String,
}

impl ErrorPage {
    fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            title: if status == StatusCode::NOT_FOUND {
                "Página não encontrada"
            } else {
                "Algo deu errado"
            },
            message,
        }
    }

    fn render(self, layout: Layout) -> Response {
        let rendered = ErrorTemplate {
            layout,
            status: self.status.as_u16(),
            title: self.title,
            message: &self.message,
        }
        .render();
        let mut response = match rendered {
            Ok(body) => (self.status, Html(body)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render error page");
                (self.status, self.message.clone()).into_response()
            }
        };
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Api(e) = &self {
            if e.is_unauthorized() {
                tracing::info!("API rejected the session token");
                let mut response = Redirect::to(LOGIN_PATH).into_response();
                response.extensions_mut().insert(SessionRejected);
                return response;
            }
        }

        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        ErrorPage::new(self.status(), self.public_message()).render(Layout::default())
    }
}

/// Re-render error pages with the signed-in visitor's header.
///
/// `AppError` has no access to the session when it becomes a response, so
/// its page starts with an anonymous layout. The pending toast is left for
/// the next regular page.
pub async fn error_page_layout(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let session = request.extensions().get::<Session>().cloned();
    let mut response = next.run(request).await;

    let Some(session) = session else {
        return response;
    };
    let Some(page) = response.extensions_mut().remove::<ErrorPage>() else {
        return response;
    };
    let current = session_store::load_session(&session).await;
    page.render(Layout {
        path,
        ..Layout::new(current.as_ref(), None)
    })
}

/// Fallback for paths no route matches.
pub async fn not_found(request: Request) -> AppError {
    AppError::NotFound(request.uri().path().to_string())
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Message for a form that the API refused.
///
/// Client errors (4xx) become an inline message; anything else propagates.
///
/// # Errors
///
/// Returns the original error when it is not the visitor's to fix.
pub fn form_error(error: ApiError) -> Result<String> {
    if error.is_client_error() && !error.is_unauthorized() {
        Ok(error.user_message())
    } else {
        Err(AppError::Api(error))
    }
}

/// Set the Sentry user context.
///
/// Called whenever a request carries a session so errors are attributed.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    fn status_error(code: u16, body: &str) -> ApiError {
        ApiError::from_status(StatusCode::from_u16(code).unwrap(), body)
    }

    #[test]
    fn test_unauthorized_redirects_and_marks_session() {
        let response = AppError::Api(status_error(401, "")).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
        assert!(response.extensions().get::<SessionRejected>().is_some());
    }

    #[test]
    fn test_status_codes() {
        fn status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(status(AppError::Api(status_error(404, ""))), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Api(status_error(422, ""))), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::Api(status_error(503, ""))), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(AppError::Api(ApiError::Transport("timeout".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(AppError::NotFound("product".into())),
            StatusCode::NOT_FOUND
        );
        let unreadable = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(
            status(AppError::Session(
                tower_sessions::session::Error::SerdeJson(unreadable)
            )),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_page_is_kept_on_the_response() {
        let response = AppError::NotFound("product 9".into()).into_response();
        let page = response.extensions().get::<ErrorPage>().unwrap();
        assert_eq!(page.status, StatusCode::NOT_FOUND);
        assert_eq!(page.title, "Página não encontrada");
        assert_eq!(page.message, NOT_FOUND_MESSAGE);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Api(status_error(500, r#"{"error":"db down at 10.0.0.5"}"#));
        assert_eq!(err.public_message(), GENERIC_MESSAGE);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_form_error() {
        let refused = status_error(400, r#"{"error":"E-mail já cadastrado"}"#);
        assert_eq!(form_error(refused).unwrap(), "E-mail já cadastrado");
        assert!(form_error(status_error(502, "")).is_err());
        assert!(form_error(status_error(401, "")).is_err());
    }
}
