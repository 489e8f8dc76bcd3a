//! Cart pages. Every action requires a session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use vitrine_api::CartItemInput;
use vitrine_core::{CartItemId, ProductId, VariantId};

use super::views::{CartLine, TotalsView, non_blank};
use crate::error::{Result, add_breadcrumb, form_error};
use crate::filters;
use crate::middleware::RequireSession;
use crate::middleware::session_store::set_flash;
use crate::models::{Flash, Layout};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub layout: Layout,
    pub lines: Vec<CartLine>,
    pub totals: TotalsView,
}

/// The cart with subtotal, shipping and total.
#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn show(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    layout: Layout,
) -> Result<CartTemplate> {
    let cart = state.api_as(&current).cart().await?;
    let totals = cart.totals(state.config().shipping);

    Ok(CartTemplate {
        layout,
        lines: cart.items.iter().map(CartLine::from).collect(),
        totals: totals.into(),
    })
}

/// Add-to-cart form on the product page.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

/// Add a product to the cart.
#[instrument(skip(current, state, session), fields(user_id = %current.user.id))]
pub async fn add(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let input = CartItemInput {
        product_id: ProductId::from(form.product_id.as_str()),
        variant_id: non_blank(form.variant_id.as_deref()).map(VariantId::from),
        quantity: form.quantity.unwrap_or(1).max(1),
    };

    match state.api_as(&current).add_to_cart(&input).await {
        Ok(()) => {
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", form.product_id.as_str())]));
            set_flash(&session, Flash::success("Produto adicionado ao carrinho.")).await?;
            Ok(Redirect::to("/cart"))
        }
        Err(e) => {
            let message = form_error(e)?;
            set_flash(&session, Flash::error(message)).await?;
            Ok(Redirect::to(&format!(
                "/products/{}",
                urlencoding::encode(&form.product_id)
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: u32,
}

/// Change a line's quantity; zero removes it.
#[instrument(skip(current, state, session), fields(user_id = %current.user.id))]
pub async fn update(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect> {
    let api = state.api_as(&current);
    let id = CartItemId::from(id.as_str());
    let result = if form.quantity == 0 {
        api.remove_cart_item(&id).await
    } else {
        api.update_cart_item(&id, form.quantity).await
    };

    if let Err(e) = result {
        set_flash(&session, Flash::error(form_error(e)?)).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(current, state, session), fields(user_id = %current.user.id))]
pub async fn remove(
    RequireSession(current): RequireSession,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    match state
        .api_as(&current)
        .remove_cart_item(&CartItemId::from(id.as_str()))
        .await
    {
        Ok(()) => set_flash(&session, Flash::info("Item removido do carrinho.")).await?,
        Err(e) => set_flash(&session, Flash::error(form_error(e)?)).await?,
    }
    Ok(Redirect::to("/cart"))
}
