//! Errors returned by API calls.

use reqwest::StatusCode;
use thiserror::Error;

/// Generic message shown when the API gave no usable explanation.
pub const GENERIC_MESSAGE: &str = "Não foi possível concluir a operação. Tente novamente.";

/// A failed call to the REST API.
///
/// Failures are not classified beyond what the caller needs to react: the
/// request never got an answer, the API answered with an error status, or
/// the answer could not be read. The type is `Clone` because coalesced cache
/// reads hand the same error to every waiter.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// Connection, timeout or other transport failure.
    #[error("API request failed: {0}")]
    Transport(String),

    /// The API answered with a non-success status.
    #[error("API returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: StatusCode,
        /// The `error` or `message` field of a JSON error body.
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("invalid API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error from a response body.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        Self::Status {
            status,
            message: server_message(body),
        }
    }

    /// The HTTP status, if the API answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The API rejected the bearer token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// The requested entity does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// The caller sent something the API refused (4xx other than 401/404).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| s.is_client_error())
    }

    /// Worth retrying a read: transport failures and 5xx.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => status.is_server_error(),
            Self::Decode(_) => false,
        }
    }

    /// Message safe to show to a visitor.
    ///
    /// Server-provided messages are shown for 4xx answers only; anything else
    /// collapses into a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                status,
                message: Some(message),
            } if status.is_client_error() => message.clone(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Extract `error` or `message` from a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .into_iter()
        .find_map(|field| value.get(field)?.as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}
