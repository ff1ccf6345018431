//! Checkout route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::cart::CartView;
use crate::services::checkout::{self, OrderHandoff};
use crate::state::{AppState, StateError};

/// Prepare the WhatsApp order hand-off for the current cart.
///
/// The cart is left as is; the device opens the returned link and calls
/// `/checkout/complete` once the OS accepted it. Before the first identity
/// event it is not yet known whether anyone is signed in, so this answers 409.
#[instrument(skip(state))]
pub async fn prepare(State(state): State<AppState>) -> Result<Json<OrderHandoff>> {
    let merchant = state.checkout().merchant_whatsapp.as_str();
    let handoff = state
        .read(|stores| {
            if !stores.session.is_ready() {
                return Err(AppError::from(StateError::SessionNotReady));
            }
            checkout::prepare(stores.session.identity(), &stores.cart, merchant)
                .map_err(AppError::from)
        })
        .await?;

    tracing::info!(
        total = %handoff.total,
        item_count = handoff.item_count,
        "Order hand-off prepared"
    );
    add_breadcrumb("checkout", "Prepared order hand-off", &[]);
    Ok(Json(handoff))
}

/// The hand-off was acknowledged; empty the cart.
#[instrument(skip(state))]
pub async fn complete(State(state): State<AppState>) -> Json<CartView> {
    let view = state
        .update(|stores| {
            checkout::complete(&mut stores.cart);
            CartView::from(&stores.cart)
        })
        .await;
    tracing::info!("Order handed off, cart emptied");
    Json(view)
}
