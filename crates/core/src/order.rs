//! Placed orders as read back from the backend.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OrderStatus, ProductId, UserId};

/// One product line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// A placed order document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub uid: UserId,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Recorded status, or [`OrderStatus::Processing`] when unset.
    #[must_use]
    pub fn status_or_default(&self) -> OrderStatus {
        self.status.unwrap_or_default()
    }
}

/// Keep `uid`'s orders and sort them newest first.
///
/// Orders without a creation time go last, in their original order.
#[must_use]
pub fn history_for(uid: &UserId, orders: Vec<Order>) -> Vec<Order> {
    let mut mine: Vec<Order> = orders.into_iter().filter(|o| &o.uid == uid).collect();
    // Reverse comparison puts `None` (smallest) last.
    mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    mine
}
