//! Back-office user accounts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use vitrine_api::{Api, UserInput};
use vitrine_core::validation::{self, ValidationError};
use vitrine_core::{Role, User, UserId};

use crate::error::{Result, form_error};
use crate::middleware::RequireAdmin;
use crate::middleware::session_store::set_flash;
use crate::models::{Flash, Layout};
use crate::routes::views::{SelectOption, UserRow, non_blank};
use crate::state::AppState;

const USERS_PATH: &str = "/admin/users";

#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub layout: Layout,
    pub users: Vec<UserRow>,
    pub current_id: String,
}

/// Every account.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<UsersTemplate> {
    let users = state.api_as(&admin).users().await?;
    Ok(UsersTemplate {
        layout,
        users: users.iter().map(UserRow::from).collect(),
        current_id: admin.user.id.to_string(),
    })
}

/// User form fields.
#[derive(Clone, Default, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

impl std::fmt::Debug for UserForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl UserForm {
    fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.as_str().to_string(),
            ..Self::default()
        }
    }

    fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }

    /// Local checks. A new account needs a password; an edit only checks one
    /// when typed.
    fn to_input(&self, creating: bool) -> std::result::Result<UserInput, ValidationError> {
        validation::require_name(&self.name)?;
        validation::validate_email(&self.email)?;
        let password = if creating || !self.password.is_empty() {
            validation::validate_new_password(&self.password, &self.password_confirmation)?;
            Some(self.password.clone())
        } else {
            None
        };
        Ok(UserInput {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_blank(Some(self.phone.as_str())),
            role: self.role(),
            password,
        })
    }

    /// Values to echo back; passwords are never re-rendered.
    fn cleared(self) -> Self {
        Self {
            password: String::new(),
            password_confirmation: String::new(),
            ..self
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/user_form.html")]
pub struct UserFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub creating: bool,
    pub form: UserForm,
    pub roles: Vec<SelectOption>,
    pub error: Option<String>,
}

fn render_form(layout: Layout, id: Option<&str>, form: UserForm, error: Option<String>) -> Response {
    let role = form.role();
    UserFormTemplate {
        layout,
        title: if id.is_some() { "Editar usuário" } else { "Novo usuário" },
        action: id.map_or_else(
            || USERS_PATH.to_string(),
            |id| format!("{USERS_PATH}/{}", urlencoding::encode(id)),
        ),
        creating: id.is_none(),
        form: form.cleared(),
        roles: [Role::Customer, Role::Admin]
            .iter()
            .map(|r| SelectOption::new(r.as_str(), r.label(), *r == role))
            .collect(),
        error,
    }
    .into_response()
}

/// Empty user form.
pub async fn new(RequireAdmin(_): RequireAdmin, layout: Layout) -> Response {
    render_form(layout, None, UserForm::default(), None)
}

/// Create an account.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<UserForm>,
) -> Result<Response> {
    save(&state.api_as(&admin), &session, layout, None, form).await
}

/// User form filled with the current values.
#[instrument(skip(admin, state, layout), fields(admin_id = %admin.user.id))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    layout: Layout,
) -> Result<Response> {
    let user = state.api_as(&admin).user(&UserId::from(id.as_str())).await?;
    Ok(render_form(layout, Some(&id), UserForm::from_user(&user), None))
}

/// Save changes to an account.
#[instrument(skip(admin, state, session, layout, form), fields(admin_id = %admin.user.id))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    layout: Layout,
    Form(form): Form<UserForm>,
) -> Result<Response> {
    save(&state.api_as(&admin), &session, layout, Some(&id), form).await
}

async fn save(
    api: &Api,
    session: &Session,
    layout: Layout,
    id: Option<&str>,
    form: UserForm,
) -> Result<Response> {
    let input = match form.to_input(id.is_none()) {
        Ok(input) => input,
        Err(e) => return Ok(render_form(layout, id, form, Some(e.to_string()))),
    };

    let result = match id {
        Some(id) => api.update_user(&UserId::from(id), &input).await,
        None => api.create_user(&input).await,
    };
    match result {
        Ok(()) => {
            let message = if id.is_some() { "Usuário atualizado." } else { "Usuário criado." };
            set_flash(session, Flash::success(message)).await?;
            Ok(Redirect::to(USERS_PATH).into_response())
        }
        Err(e) => Ok(render_form(layout, id, form, Some(form_error(e)?))),
    }
}

/// Delete an account other than the caller's own.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.user.id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let user_id = UserId::from(id.as_str());
    if user_id == admin.user.id {
        set_flash(&session, Flash::error("Você não pode excluir a própria conta.")).await?;
        return Ok(Redirect::to(USERS_PATH));
    }
    match state.api_as(&admin).delete_user(&user_id).await {
        Ok(()) => set_flash(&session, Flash::info("Usuário excluído.")).await?,
        Err(e) => set_flash(&session, Flash::error(form_error(e)?)).await?,
    }
    Ok(Redirect::to(USERS_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str, confirmation: &str) -> UserForm {
        UserForm {
            name: "Carla".into(),
            email: "carla@loja.com".into(),
            role: "ADMIN".into(),
            password: password.into(),
            password_confirmation: confirmation.into(),
            ..UserForm::default()
        }
    }

    #[test]
    fn test_create_requires_matching_password() {
        assert_eq!(
            form("segredo1", "segredo2").to_input(true).unwrap_err(),
            ValidationError::PasswordMismatch
        );
        assert_eq!(
            form("", "").to_input(true).unwrap_err(),
            ValidationError::PasswordTooShort
        );
        let input = form("segredo1", "segredo1").to_input(true).unwrap();
        assert_eq!(input.role, Role::Admin);
        assert_eq!(input.password.as_deref(), Some("segredo1"));
    }

    #[test]
    fn test_edit_keeps_password_when_blank() {
        let input = form("", "").to_input(false).unwrap();
        assert!(input.password.is_none());
        assert!(form("novasenha", "outra").to_input(false).is_err());
    }

    #[test]
    fn test_unknown_role_is_customer() {
        let mut f = form("segredo1", "segredo1");
        f.role = "root".into();
        assert_eq!(f.to_input(true).unwrap().role, Role::Customer);
    }

    #[test]
    fn test_debug_hides_password() {
        assert!(!format!("{:?}", form("segredo1", "segredo1")).contains("segredo1"));
    }
}
