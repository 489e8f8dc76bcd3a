//! Back-office order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use vitrine_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result, form_error};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::middleware::session_store::set_flash;
use crate::models::{Flash, Layout};
use crate::routes::views::{OrderLine, OrderRow, SelectOption, non_blank};
use crate::state::AppState;

const ORDERS_PATH: &str = "/admin/orders";

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

impl StatusFilter {
    /// Unknown or blank values mean "all".
    fn parse(&self) -> Option<OrderStatus> {
        non_blank(self.status.as_deref()).and_then(|s| s.parse().ok())
    }
}

fn status_options(current: Option<OrderStatus>) -> Vec<SelectOption> {
    OrderStatus::ALL
        .iter()
        .map(|s| SelectOption::new(s.as_str(), s.label(), Some(*s) == current))
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRow>,
    pub statuses: Vec<SelectOption>,
    pub filtered: bool,
}

/// Every order, optionally filtered by status.
#[instrument(skip(admin, state, layout), fields(admin_id = %admin.user.id))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
    layout: Layout,
) -> Result<OrdersTemplate> {
    let status = filter.parse();
    let orders = state.api_as(&admin).all_orders(status).await?;
    Ok(OrdersTemplate {
        layout,
        orders: orders.iter().map(|o| OrderRow::new(o, ORDERS_PATH)).collect(),
        statuses: status_options(status),
        filtered: status.is_some(),
    })
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub order: OrderRow,
    pub lines: Vec<OrderLine>,
    pub address: Option<String>,
    pub statuses: Vec<SelectOption>,
}

/// One order with its status form.
#[instrument(skip(admin, state, layout), fields(admin_id = %admin.user.id))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    layout: Layout,
) -> Result<OrderTemplate> {
    let order = state.api_as(&admin).order(&OrderId::from(id.as_str())).await?;
    Ok(OrderTemplate {
        layout,
        lines: order.items.iter().map(OrderLine::from).collect(),
        address: order.address.as_ref().map(vitrine_core::Address::one_line),
        statuses: status_options(Some(order.status)),
        order: OrderRow::new(&order, ORDERS_PATH),
    })
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Move an order to another status.
#[instrument(skip(admin, state, session), fields(admin_id = %admin.user.id))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("unknown order status: {}", form.status)))?;
    let order_id = OrderId::from(id.as_str());

    match state.api_as(&admin).update_order_status(&order_id, status).await {
        Ok(()) => {
            info!(order_id = %order_id, status = status.as_str(), "Order status updated");
            let message = format!("Status alterado para {}.", status.label());
            set_flash(&session, Flash::success(message)).await?;
        }
        Err(e) => set_flash(&session, Flash::error(form_error(e)?)).await?,
    }
    Ok(Redirect::to(&format!(
        "{ORDERS_PATH}/{}",
        urlencoding::encode(order_id.as_str())
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter() {
        let filter = |s: &str| StatusFilter { status: Some(s.to_string()) }.parse();
        assert_eq!(filter("SHIPPED"), Some(OrderStatus::Shipped));
        assert_eq!(filter(""), None);
        assert_eq!(filter("lost"), None);
        assert_eq!(StatusFilter::default().parse(), None);
    }

    #[test]
    fn test_status_options_mark_current() {
        let options = status_options(Some(OrderStatus::Delivered));
        assert_eq!(options.len(), OrderStatus::ALL.len());
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(options.iter().any(|o| o.selected && o.value == "DELIVERED"));
    }
}
