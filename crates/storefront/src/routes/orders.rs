//! Order history route handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use freshbasket_core::{Order, OrderId, OrderItem, OrderStatus, format_rupees};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::orders::order_history;
use crate::state::AppState;

/// Order display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub status: OrderStatus,
    pub status_label: String,
    pub total_amount: Decimal,
    pub total_display: String,
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let status = order.status_or_default();
        Self {
            id: order.id,
            status,
            status_label: status.label().to_string(),
            total_amount: order.total_amount,
            total_display: format_rupees(order.total_amount),
            created_at: order.created_at,
            items: order.items,
        }
    }
}

/// List the signed-in user's orders, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<OrderView>>> {
    let uid = state
        .read(|stores| stores.session.identity().map(|i| i.uid.clone()))
        .await
        .ok_or_else(|| AppError::Unauthorized("Sign in to see your orders".to_string()))?;

    let orders = order_history(state.orders(), &uid).await;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}
