//! Contact form.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use crate::client::Api;
use crate::error::ApiError;

/// A message from the contact page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl Api {
    /// Forward a contact message. Works with or without a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the message or the call fails.
    #[instrument(skip_all, fields(email = %message.email))]
    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), ApiError> {
        self.write_discard(Method::POST, "/contact/send", Some(message), &[])
            .await
    }
}
