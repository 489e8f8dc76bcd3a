//! The signed-in customer's account: profile, orders and addresses.

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

use vitrine_api::{AddressInput, ProfileUpdate};
use vitrine_core::validation::{self, ValidationError};
use vitrine_core::{AddressId, OrderId};

use super::views::{AddressView, OrderLine, OrderRow, non_blank};
use crate::error::{Result, form_error};
use crate::filters;
use crate::middleware::RequireSession;
use crate::middleware::session_store::{set_flash, update_user};
use crate::models::{Flash, Layout};
use crate::state::AppState;

// =============================================================================
// Profile
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl ProfileForm {
    /// Local checks; the password is only changed when one is typed.
    fn to_update(&self) -> std::result::Result<ProfileUpdate, ValidationError> {
        validation::require_name(&self.name)?;
        let password = non_blank(self.password.as_deref());
        if let Some(password) = &password {
            validation::validate_new_password(
                password,
                self.password_confirmation.as_deref().unwrap_or_default().trim(),
            )?;
        }
        Ok(ProfileUpdate {
            name: self.name.trim().to_string(),
            phone: non_blank(self.phone.as_deref()),
            password,
        })
    }
}

/// Profile page, read fresh from the API.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn profile(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<ProfileTemplate> {
    let user = state.api_as(&current).me().await?;
    Ok(ProfileTemplate {
        layout,
        name: user.name,
        email: user.email,
        phone: user.phone.unwrap_or_default(),
        error: None,
    })
}

/// Save profile changes.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn update_profile(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let rerender = |error: String| ProfileTemplate {
        layout: layout.clone(),
        name: form.name.clone(),
        email: current.user.email.clone(),
        phone: form.phone.clone().unwrap_or_default(),
        error: Some(error),
    };

    let update = match form.to_update() {
        Ok(update) => update,
        Err(e) => return Ok(rerender(e.to_string()).into_response()),
    };

    match state.api_as(&current).update_profile(&update).await {
        Ok(user) => {
            update_user(&session, &user).await?;
            set_flash(&session, Flash::success("Dados atualizados.")).await?;
            Ok(Redirect::to("/account").into_response())
        }
        Err(e) => Ok(rerender(form_error(e)?).into_response()),
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRow>,
}

/// Order history.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn orders(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<OrdersTemplate> {
    let orders = state.api_as(&current).my_orders().await?;
    Ok(OrdersTemplate {
        layout,
        orders: orders
            .iter()
            .map(|o| OrderRow::new(o, "/account/orders"))
            .collect(),
    })
}

#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub order: OrderRow,
    pub lines: Vec<OrderLine>,
    pub address: Option<String>,
}

/// One order.
#[instrument(skip(current, state, layout), fields(user_id = %current.user.id))]
pub async fn order(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    layout: Layout,
) -> Result<OrderTemplate> {
    let order = state
        .api_as(&current)
        .order(&OrderId::from(id.as_str()))
        .await?;
    Ok(OrderTemplate {
        layout,
        order: OrderRow::new(&order, "/account/orders"),
        lines: order.items.iter().map(OrderLine::from).collect(),
        address: order.address.as_ref().map(vitrine_core::Address::one_line),
    })
}

// =============================================================================
// Addresses
// =============================================================================

/// Address fields, shared with checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    pub complement: Option<String>,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    /// Checkbox: present when ticked.
    pub is_default: Option<String>,
}

impl AddressForm {
    /// Presence checks, then the API payload.
    ///
    /// # Errors
    ///
    /// Returns the first missing field.
    pub fn to_input(&self) -> std::result::Result<AddressInput, ValidationError> {
        validation::require(&self.street, "rua")?;
        validation::require(&self.number, "número")?;
        validation::require(&self.neighborhood, "bairro")?;
        validation::require(&self.city, "cidade")?;
        validation::require(&self.state, "estado")?;
        validation::require(&self.zip_code, "CEP")?;

        Ok(AddressInput {
            street: self.street.trim().to_string(),
            number: self.number.trim().to_string(),
            complement: non_blank(self.complement.as_deref()),
            neighborhood: self.neighborhood.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_uppercase(),
            zip_code: self.zip_code.trim().to_string(),
            is_default: self.is_default.is_some(),
        })
    }

    /// Complement for re-rendering.
    #[must_use]
    pub fn complement_value(&self) -> &str {
        self.complement.as_deref().unwrap_or_default()
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub addresses: Vec<AddressView>,
    /// New-address form, named for the shared address fields.
    pub address: AddressForm,
    pub error: Option<String>,
}

/// Saved addresses and the new-address form.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn addresses(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<AddressesTemplate> {
    let addresses = state.api_as(&current).addresses().await?;
    Ok(AddressesTemplate {
        layout,
        addresses: addresses.iter().map(AddressView::from).collect(),
        address: AddressForm::default(),
        error: None,
    })
}

/// Save a new address.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn create_address(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let api = state.api_as(&current);

    let error = match form.to_input() {
        Ok(input) => match api.create_address(&input).await {
            Ok(_) => {
                set_flash(&session, Flash::success("Endereço salvo.")).await?;
                return Ok(Redirect::to("/account/addresses").into_response());
            }
            Err(e) => form_error(e)?,
        },
        Err(e) => e.to_string(),
    };

    let addresses = api.addresses().await?;
    Ok(AddressesTemplate {
        layout,
        addresses: addresses.iter().map(AddressView::from).collect(),
        address: form,
        error: Some(error),
    }
    .into_response())
}

/// Delete a saved address.
#[instrument(skip(current, state, session), fields(user_id = %current.user.id))]
pub async fn delete_address(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    match state
        .api_as(&current)
        .delete_address(&AddressId::from(id.as_str()))
        .await
    {
        Ok(()) => set_flash(&session, Flash::info("Endereço removido.")).await?,
        Err(e) => set_flash(&session, Flash::error(form_error(e)?)).await?,
    }
    Ok(Redirect::to("/account/addresses"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> AddressForm {
        AddressForm {
            street: "Rua das Flores".into(),
            number: "120".into(),
            complement: Some("  ".into()),
            neighborhood: "Centro".into(),
            city: "Curitiba".into(),
            state: "pr".into(),
            zip_code: "80000-000".into(),
            is_default: Some("on".into()),
        }
    }

    #[test]
    fn test_address_form_to_input() {
        let input = address().to_input().unwrap();
        assert_eq!(input.state, "PR");
        assert!(input.complement.is_none());
        assert!(input.is_default);
    }

    #[test]
    fn test_address_form_reports_missing_field() {
        let mut form = address();
        form.city = " ".into();
        assert_eq!(form.to_input().unwrap_err(), ValidationError::Required("cidade"));
    }

    #[test]
    fn test_profile_password_rules() {
        let form = ProfileForm {
            name: "Ana".into(),
            password: Some("segredo1".into()),
            password_confirmation: Some("segredo2".into()),
            ..ProfileForm::default()
        };
        assert_eq!(form.to_update().unwrap_err(), ValidationError::PasswordMismatch);

        let form = ProfileForm {
            name: "Ana".into(),
            password: Some(String::new()),
            ..ProfileForm::default()
        };
        assert!(form.to_update().unwrap().password.is_none());
    }
}
