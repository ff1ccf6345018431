//! Integration tests for FreshBasket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p freshbasket-integration-tests
//! ```
//!
//! No network access is needed: the backend and geocoder are replaced by
//! the in-memory fakes in this crate and the router is driven in-process.
//!
//! # Test Categories
//!
//! - `cart_properties` - Cart store laws
//! - `session_flow` - Identity changes, hydration, store events
//! - `api_routes` - The JSON surface through the full middleware stack

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use freshbasket_core::{Identity, Order, ProfileRecord, ProfileUpdate, UserId};
use freshbasket_storefront::backend::{BackendError, OrderHistory, ProfileDocuments};
use freshbasket_storefront::config::CheckoutConfig;
use freshbasket_storefront::routes;
use freshbasket_storefront::services::SessionService;
use freshbasket_storefront::services::geocoder::{
    Coordinates, GeocodeCooldown, GeocodeError, ReverseGeocoder,
};
use freshbasket_storefront::state::{AppState, Collaborators};
use serde_json::Value;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Merchant number every test context is configured with.
pub const MERCHANT: &str = "919876543210";

/// In-memory profile documents.
#[derive(Default)]
pub struct FakeProfiles {
    docs: Mutex<HashMap<UserId, ProfileRecord>>,
    merges: Mutex<Vec<(UserId, ProfileUpdate)>>,
    fail: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeProfiles {
    /// Store a document for `uid`.
    pub fn insert(&self, uid: &str, record: ProfileRecord) {
        self.docs
            .lock()
            .expect("profiles lock")
            .insert(UserId::from(uid), record);
    }

    /// Make every call fail until reset.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Hold fetches until the returned handle is notified.
    pub fn hold_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().expect("gate lock") = Some(Arc::clone(&gate));
        gate
    }

    /// Updates merged so far.
    pub fn merges(&self) -> Vec<(UserId, ProfileUpdate)> {
        self.merges.lock().expect("merges lock").clone()
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("fake backend down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileDocuments for FakeProfiles {
    async fn fetch_profile(&self, uid: &UserId) -> Result<Option<ProfileRecord>, BackendError> {
        let gate = self.gate.lock().expect("gate lock").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check()?;
        Ok(self.docs.lock().expect("profiles lock").get(uid).cloned())
    }

    async fn merge_profile(&self, uid: &UserId, update: &ProfileUpdate) -> Result<(), BackendError> {
        self.check()?;
        self.merges
            .lock()
            .expect("merges lock")
            .push((uid.clone(), update.clone()));
        Ok(())
    }
}

/// In-memory order documents.
#[derive(Default)]
pub struct FakeOrders {
    orders: Mutex<Vec<Order>>,
    fail: AtomicBool,
}

impl FakeOrders {
    pub fn push(&self, order: Order) {
        self.orders.lock().expect("orders lock").push(order);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderHistory for FakeOrders {
    async fn list_orders(&self, _uid: &UserId) -> Result<Vec<Order>, BackendError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 503,
                message: "fake backend down".into(),
            });
        }
        // Returns everyone's orders; filtering is the caller's job.
        Ok(self.orders.lock().expect("orders lock").clone())
    }
}

/// Geocoder answering with a fixed address, or failing when none is set.
#[derive(Default)]
pub struct FakeGeocoder {
    answer: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn answer_with(&self, address: &str) {
        *self.answer.lock().expect("answer lock") = Some(address.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse(&self, _coords: Coordinates) -> Result<String, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .lock()
            .expect("answer lock")
            .clone()
            .ok_or_else(|| GeocodeError::NotJson("text/html".into()))
    }
}

/// A storefront state wired to fakes.
pub struct TestContext {
    pub state: AppState,
    pub profiles: Arc<FakeProfiles>,
    pub orders: Arc<FakeOrders>,
    pub geocoder: Arc<FakeGeocoder>,
}

impl TestContext {
    /// Context without a geocoder cooldown.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cooldown(Duration::ZERO)
    }

    /// Context whose geocoder calls are spaced by `cooldown`.
    #[must_use]
    pub fn with_cooldown(cooldown: Duration) -> Self {
        let profiles = Arc::new(FakeProfiles::default());
        let orders = Arc::new(FakeOrders::default());
        let geocoder = Arc::new(FakeGeocoder::default());

        let state = AppState::with_collaborators(
            CheckoutConfig {
                merchant_whatsapp: MERCHANT.to_string(),
            },
            GeocodeCooldown::new(cooldown),
            Collaborators {
                profiles: profiles.clone(),
                orders: orders.clone(),
                geocoder: geocoder.clone(),
            },
        );

        Self {
            state,
            profiles,
            orders,
            geocoder,
        }
    }

    /// Session service over this context's state.
    #[must_use]
    pub fn sessions(&self) -> SessionService {
        SessionService::new(self.state.clone())
    }

    /// Sign `identity` in and wait for hydration.
    pub async fn sign_in(&self, identity: Identity) {
        self.sessions().on_identity_changed(Some(identity)).await;
    }

    /// The full application router.
    #[must_use]
    pub fn app(&self) -> Router {
        routes::app(self.state.clone())
    }

    /// Send one request through the router.
    ///
    /// Returns the status and the body parsed as JSON; non-JSON bodies come
    /// back as a string value.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("valid request");

        let response = self.app().oneshot(request).await.expect("infallible router");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A signed-in identity with a display name and email.
#[must_use]
pub fn asha() -> Identity {
    serde_json::from_value(serde_json::json!({
        "uid": "u-asha",
        "display_name": "Asha",
        "email": "asha@example.in"
    }))
    .expect("valid identity")
}

/// A second identity with only a phone number.
#[must_use]
pub fn ravi() -> Identity {
    Identity {
        phone: Some("+919800000000".into()),
        ..Identity::new("u-ravi")
    }
}
