//! Contact form.

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

use vitrine_api::ContactMessage;
use vitrine_core::validation::{self, ValidationError};

use super::views::non_blank;
use crate::error::{Result, form_error};
use crate::filters;
use crate::middleware::OptionalSession;
use crate::middleware::session_store::set_flash;
use crate::models::{Flash, Layout};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
    pub form: ContactForm,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    fn to_message(&self) -> std::result::Result<ContactMessage, ValidationError> {
        validation::require_name(&self.name)?;
        validation::validate_email(&self.email)?;
        validation::require(&self.message, "mensagem")?;
        Ok(ContactMessage {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: non_blank(Some(self.subject.as_str())),
            message: self.message.trim().to_string(),
        })
    }
}

/// Contact page, pre-filled for signed-in visitors.
pub async fn show(OptionalSession(current): OptionalSession, layout: Layout) -> ContactTemplate {
    let form = current
        .map(|c| ContactForm {
            name: c.user.name,
            email: c.user.email,
            ..ContactForm::default()
        })
        .unwrap_or_default();
    ContactTemplate {
        layout,
        form,
        error: None,
    }
}

/// Send a message.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    let error = match form.to_message() {
        Ok(message) => match state.api().send_contact(&message).await {
            Ok(()) => {
                set_flash(&session, Flash::success("Mensagem enviada! Responderemos em breve."))
                    .await?;
                return Ok(Redirect::to("/contact").into_response());
            }
            Err(e) => form_error(e)?,
        },
        Err(e) => e.to_string(),
    };

    Ok(ContactTemplate {
        layout,
        form,
        error: Some(error),
    }
    .into_response())
}
