//! Checkout: pick or create an address, choose a payment method, place the
//! order.

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

use vitrine_api::{Api, OrderInput};
use vitrine_core::{AddressId, PaymentMethod};

use super::account::AddressForm;
use super::views::{AddressView, CartLine, SelectOption, TotalsView};
use crate::error::{Result, add_breadcrumb, form_error};
use crate::filters;
use crate::middleware::RequireSession;
use crate::middleware::session_store::set_flash;
use crate::models::{Flash, Layout};
use crate::state::AppState;

/// Value of the address radio that selects the new-address fields.
const NEW_ADDRESS: &str = "new";

#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub lines: Vec<CartLine>,
    pub totals: TotalsView,
    pub addresses: Vec<AddressChoice>,
    pub new_address_selected: bool,
    pub address: AddressForm,
    pub payment_methods: Vec<SelectOption>,
    pub error: Option<String>,
}

/// Saved address offered as a radio option.
#[derive(Debug, Clone)]
pub struct AddressChoice {
    pub address: AddressView,
    pub checked: bool,
}

/// Checkout submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub address_id: String,
    #[serde(default)]
    pub payment_method: String,
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
}

impl CheckoutForm {
    fn address(&self) -> AddressForm {
        AddressForm {
            street: self.street.clone(),
            number: self.number.clone(),
            complement: self.complement.clone(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            is_default: None,
        }
    }

    fn wants_new_address(&self) -> bool {
        let id = self.address_id.trim();
        id.is_empty() || id == NEW_ADDRESS
    }
}

/// Checkout page. An empty cart sends the visitor back to the cart.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn show(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
) -> Result<Response> {
    let api = state.api_as(&current);
    render(&state, &api, &session, layout, CheckoutForm::default(), None).await
}

/// Place the order.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn place_order(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let api = state.api_as(&current);

    let Ok(payment_method) = form.payment_method.parse::<PaymentMethod>() else {
        let error = Some("Escolha uma forma de pagamento.".to_string());
        return render(&state, &api, &session, layout, form, error).await;
    };

    let address_id = if form.wants_new_address() {
        let input = match form.address().to_input() {
            Ok(input) => input,
            Err(e) => {
                return render(&state, &api, &session, layout, form, Some(e.to_string())).await;
            }
        };
        match api.create_address(&input).await {
            Ok(address) => address.id,
            Err(e) => {
                let error = Some(form_error(e)?);
                return render(&state, &api, &session, layout, form, error).await;
            }
        }
    } else {
        AddressId::from(form.address_id.trim())
    };

    let order = OrderInput {
        address_id,
        payment_method,
    };
    match api.create_order(&order).await {
        Ok(order) => {
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
            set_flash(&session, Flash::success("Pedido realizado com sucesso!")).await?;
            let href = format!("/account/orders/{}", urlencoding::encode(order.id.as_str()));
            Ok(Redirect::to(&href).into_response())
        }
        Err(e) => {
            let error = Some(form_error(e)?);
            render(&state, &api, &session, layout, form, error).await
        }
    }
}

async fn render(
    state: &AppState,
    api: &Api,
    session: &Session,
    layout: Layout,
    form: CheckoutForm,
    error: Option<String>,
) -> Result<Response> {
    let (cart, addresses) = tokio::join!(api.cart(), api.addresses());
    let cart = cart?;
    if cart.is_empty() {
        set_flash(session, Flash::info("Seu carrinho está vazio.")).await?;
        return Ok(Redirect::to("/cart").into_response());
    }
    let addresses = addresses?;

    let selected = if form.address_id.is_empty() {
        addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| addresses.first())
            .map(|a| a.id.to_string())
            .unwrap_or_default()
    } else {
        form.address_id.clone()
    };
    let new_address_selected = selected.is_empty() || selected == NEW_ADDRESS;

    let payment_methods = PaymentMethod::ALL
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let selected = if form.payment_method.is_empty() {
                i == 0
            } else {
                form.payment_method == m.as_str()
            };
            SelectOption::new(m.as_str(), m.label(), selected)
        })
        .collect();

    Ok(CheckoutTemplate {
        layout,
        lines: cart.items.iter().map(CartLine::from).collect(),
        totals: cart.totals(state.config().shipping).into(),
        addresses: addresses
            .iter()
            .map(|a| AddressChoice {
                checked: a.id.as_str() == selected,
                address: AddressView::from(a),
            })
            .collect(),
        new_address_selected,
        address: form.address(),
        payment_methods,
        error,
    }
    .into_response())
}
