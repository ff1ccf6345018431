//! HTTP route handlers for storefront.
//!
//! The view layer renders from these JSON views and sends every user action
//! back as a command. Commands on unknown ids answer with the unchanged view.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Health check
//!
//! # Session
//! GET    /session                   - Readiness, identity, greeting
//! POST   /session/identity          - Identity event (Identity or null)
//!
//! # Cart
//! GET    /cart                      - Lines and totals
//! POST   /cart/items                - Add one unit of a product
//! PATCH  /cart/items/{id}           - Change quantity by delta
//! DELETE /cart/items/{id}           - Remove a line
//! DELETE /cart                      - Empty the cart
//!
//! # Profile
//! GET    /profile                   - Profile and selected address
//! PATCH  /profile                   - Update name/phone/email
//! POST   /profile/addresses         - Add a typed or map-picked address
//! PUT    /profile/selected-address  - Choose the delivery address
//! POST   /locations/lookup          - Reverse geocode a map position
//!
//! # Orders
//! GET    /orders                    - Order history (requires sign-in)
//! POST   /checkout                  - Prepare WhatsApp hand-off
//! POST   /checkout/complete         - Hand-off acknowledged, empty cart
//! ```

pub mod cart;
pub mod checkout;
pub mod locations;
pub mod orders;
pub mod profile;
pub mod session;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the storefront routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(session::show))
        .route("/session/identity", post(session::identity_changed))
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route(
            "/cart/items/{id}",
            patch(cart::update_quantity).delete(cart::remove),
        )
        .route("/profile", get(profile::show).patch(profile::update))
        .route("/profile/addresses", post(profile::add_address))
        .route("/profile/selected-address", put(profile::select_address))
        .route("/locations/lookup", post(locations::lookup))
        .route("/orders", get(orders::index))
        .route("/checkout", post(checkout::prepare))
        .route("/checkout/complete", post(checkout::complete))
}

/// Build the full application with middleware.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
