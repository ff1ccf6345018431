//! Order history for the signed-in user.

use freshbasket_core::{Order, UserId, history_for};
use tracing::instrument;

use crate::backend::OrderHistory;

/// The user's orders, newest first.
///
/// A backend failure yields an empty history and a warning; the screen shows
/// "no orders" rather than an error.
#[instrument(skip(orders), fields(uid = %uid))]
pub async fn order_history(orders: &dyn OrderHistory, uid: &UserId) -> Vec<Order> {
    match orders.list_orders(uid).await {
        Ok(all) => history_for(uid, all),
        Err(e) => {
            tracing::warn!(error = %e, "Order history unavailable");
            Vec::new()
        }
    }
}
