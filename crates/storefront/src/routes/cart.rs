//! Cart route handlers.
//!
//! The cart lives only in memory for this session. Every handler answers
//! with the full [`CartView`] so the view layer can re-render in one step.

use axum::{
    Json,
    extract::{Path, State},
};
use freshbasket_core::{
    CartCandidate, CartLineItem, CartStore, ImageRef, Price, ProductId, ProductRecord,
    format_rupees,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// One cart line for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineView {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<ImageRef>,
    pub quantity: u32,
    pub line_total: Decimal,
    pub line_total_display: String,
}

impl From<&CartLineItem> for CartLineView {
    fn from(line: &CartLineItem) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            image: line.image.clone(),
            quantity: line.quantity(),
            line_total: line.line_total(),
            line_total_display: format_rupees(line.line_total()),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_cost: Decimal,
    pub total_display: String,
    pub total_item_count: u64,
    pub revision: u64,
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            total_cost: cart.total_cost(),
            total_display: format_rupees(cart.total_cost()),
            total_item_count: cart.total_item_count(),
            revision: cart.revision(),
        }
    }
}

/// Quantity change request.
#[derive(Debug, Deserialize)]
pub struct QuantityChange {
    pub delta: i64,
}

/// Apply `f` to the cart and return the resulting view.
async fn mutate(state: &AppState, f: impl FnOnce(&mut CartStore)) -> CartView {
    state
        .update(|stores| {
            f(&mut stores.cart);
            CartView::from(&stores.cart)
        })
        .await
}

/// Show the cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    Json(state.read(|stores| CartView::from(&stores.cart)).await)
}

/// Add one unit of a catalog product.
#[instrument(skip(state, record), fields(product_id = %record.id))]
pub async fn add(
    State(state): State<AppState>,
    Json(record): Json<ProductRecord>,
) -> Result<Json<CartView>> {
    if record.id.trim().is_empty() {
        return Err(AppError::BadRequest("Product id is required".to_string()));
    }

    let candidate = CartCandidate::from(record);
    add_breadcrumb("cart", "Added item", &[("product_id", candidate.id.as_str())]);
    Ok(Json(mutate(&state, |cart| cart.add_item(candidate)).await))
}

/// Change a line's quantity; zero or below removes it.
#[instrument(skip(state))]
pub async fn update_quantity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<QuantityChange>,
) -> Json<CartView> {
    let id = ProductId::from(id);
    Json(mutate(&state, |cart| cart.update_quantity(&id, change.delta)).await)
}

/// Remove a line.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Json<CartView> {
    let id = ProductId::from(id);
    Json(mutate(&state, |cart| cart.remove_item(&id)).await)
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Json<CartView> {
    add_breadcrumb("cart", "Cleared cart", &[]);
    Json(mutate(&state, CartStore::clear).await)
}
