//! The JSON surface, driven through the full middleware stack.

use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::{TimeZone, Utc};
use freshbasket_core::{Order, OrderId, UserId};
use freshbasket_integration_tests::{MERCHANT, TestContext, asha};
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn ginger() -> Value {
    json!({"id": "1", "name": "Ginger", "price": 25, "image": "ginger.png"})
}

fn order(id: &str, uid: &str, secs: Option<i64>) -> Order {
    Order {
        id: OrderId::from(id),
        uid: UserId::from(uid),
        status: None,
        total_amount: Decimal::from(120),
        created_at: secs.and_then(|s| Utc.timestamp_opt(s, 0).single()),
        items: Vec::new(),
    }
}

// ============================================================================
// Health & Session
// ============================================================================

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();
    let (status, body) = ctx.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let ctx = TestContext::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "tap-42")
        .body(Body::empty())
        .expect("valid request");
    let response = ctx.app().oneshot(request).await.expect("infallible router");

    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("tap-42")
    );
}

#[tokio::test]
async fn test_session_lifecycle() {
    let ctx = TestContext::new();

    let (_, body) = ctx.send(Method::GET, "/session", None).await;
    assert_eq!(body["ready"], json!(false));
    assert_eq!(body["phase"], json!("uninitialized"));

    let (status, body) = ctx
        .send(Method::POST, "/session/identity", Some(json!(asha())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], json!("ready_authenticated"));
    assert_eq!(body["greeting"], json!("Asha"));
    assert_eq!(body["initial"], json!("A"));

    let (_, body) = ctx
        .send(Method::POST, "/session/identity", Some(Value::Null))
        .await;
    assert_eq!(body["ready"], json!(true));
    assert_eq!(body["phase"], json!("ready_anonymous"));
    assert_eq!(body["greeting"], json!("User"));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_add_same_product_twice() {
    let ctx = TestContext::new();
    ctx.send(Method::POST, "/cart/items", Some(ginger())).await;
    let (status, body) = ctx.send(Method::POST, "/cart/items", Some(ginger())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["items"][0]["quantity"], json!(2));
    assert_eq!(body["items"][0]["image"], json!("ginger.png"));
    assert_eq!(body["total_cost"], json!("50"));
    assert_eq!(body["total_display"], json!("₹50"));
    assert_eq!(body["total_item_count"], json!(2));
}

#[tokio::test]
async fn test_decrement_to_zero_empties_cart() {
    let ctx = TestContext::new();
    ctx.send(Method::POST, "/cart/items", Some(ginger())).await;

    let (_, body) = ctx
        .send(Method::PATCH, "/cart/items/1", Some(json!({"delta": -1})))
        .await;
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total_cost"], json!("0"));
}

#[tokio::test]
async fn test_unknown_ids_are_silent_noops() {
    let ctx = TestContext::new();
    let (_, before) = ctx.send(Method::POST, "/cart/items", Some(ginger())).await;

    let (status, after) = ctx
        .send(Method::PATCH, "/cart/items/missing", Some(json!({"delta": 3})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, before);

    let (status, after) = ctx.send(Method::DELETE, "/cart/items/missing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_remove_and_clear() {
    let ctx = TestContext::new();
    ctx.send(Method::POST, "/cart/items", Some(ginger())).await;
    ctx.send(
        Method::POST,
        "/cart/items",
        Some(json!({"id": "2", "name": "Tomato", "price": "40"})),
    )
    .await;

    let (_, body) = ctx.send(Method::DELETE, "/cart/items/1", None).await;
    assert_eq!(body["items"][0]["id"], json!("2"));

    let (_, body) = ctx.send(Method::DELETE, "/cart", None).await;
    assert_eq!(body["total_item_count"], json!(0));
    assert_eq!(body["total_cost"], json!("0"));
}

#[tokio::test]
async fn test_huge_price_keeps_cart_usable() {
    let ctx = TestContext::new();
    let gold = json!({"id": "g", "name": "Gold", "price": "79228162514264337593543950335"});

    ctx.send(Method::POST, "/cart/items", Some(gold.clone())).await;
    let (status, body) = ctx.send(Method::POST, "/cart/items", Some(gold)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_cost"], json!("79228162514264337593543950335"));

    let (status, body) = ctx.send(Method::POST, "/cart/items", Some(ginger())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_item_count"], json!(3));

    let (status, body) = ctx
        .send(Method::PATCH, "/cart/items/g", Some(json!({"delta": -2})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_cost"], json!("25"));
}

#[tokio::test]
async fn test_product_without_id_is_rejected() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .send(Method::POST, "/cart/items", Some(json!({"id": " ", "price": 5})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_waits_for_session() {
    let ctx = TestContext::new();
    ctx.send(Method::POST, "/cart/items", Some(ginger())).await;

    let (status, _) = ctx.send(Method::POST, "/checkout", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_requires_login() {
    let ctx = TestContext::new();
    ctx.sessions().on_identity_changed(None).await;
    ctx.send(Method::POST, "/cart/items", Some(ginger())).await;

    let (status, body) = ctx.send(Method::POST, "/checkout", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Please login to place an order"));
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;

    let (status, body) = ctx.send(Method::POST, "/checkout", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!("Your cart is empty"));
}

#[tokio::test]
async fn test_checkout_hand_off_then_complete() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;
    ctx.send(Method::POST, "/cart/items", Some(ginger())).await;
    ctx.send(Method::POST, "/cart/items", Some(ginger())).await;

    let (status, body) = ctx.send(Method::POST, "/checkout", None).await;
    assert_eq!(status, StatusCode::OK);

    let link = body["link"].as_str().unwrap_or_default();
    assert!(link.starts_with(&format!("whatsapp://send?phone={MERCHANT}&text=")));
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains("*Customer:* Asha"));
    assert!(message.contains("*Contact:* asha@example.in"));
    assert!(message.contains("1. Ginger x 2 - ₹50"));
    assert!(message.contains("*Total Amount: ₹50*"));

    // Preparing does not touch the cart.
    let (_, cart) = ctx.send(Method::GET, "/cart", None).await;
    assert_eq!(cart["total_item_count"], json!(2));

    let (_, cart) = ctx.send(Method::POST, "/checkout/complete", None).await;
    assert_eq!(cart["items"], json!([]));
}

// ============================================================================
// Profile & Addresses
// ============================================================================

#[tokio::test]
async fn test_typed_address_is_added_and_selected() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;

    let (status, address) = ctx
        .send(
            Method::POST,
            "/profile/addresses",
            Some(json!({"details": "12 Green St, Springfield"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(address["label"], json!("12 Green St"));

    let (_, profile) = ctx.send(Method::GET, "/profile", None).await;
    assert_eq!(profile["selected_address"], address);
    assert_eq!(profile["addresses"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_empty_address_uses_fallback_label() {
    let ctx = TestContext::new();
    let (_, address) = ctx
        .send(Method::POST, "/profile/addresses", Some(json!({"details": ""})))
        .await;
    assert_eq!(address["label"], json!("Selected location"));
}

#[tokio::test]
async fn test_select_address() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;
    let (_, home) = ctx
        .send(
            Method::POST,
            "/profile/addresses",
            Some(json!({"details": "Home, 1st Cross"})),
        )
        .await;
    ctx.send(
        Method::POST,
        "/profile/addresses",
        Some(json!({"details": "Work, MG Road"})),
    )
    .await;

    let (_, profile) = ctx
        .send(
            Method::PUT,
            "/profile/selected-address",
            Some(json!({"address_id": home["id"]})),
        )
        .await;
    assert_eq!(profile["selected_address"]["label"], json!("Home"));

    let (status, profile) = ctx
        .send(
            Method::PUT,
            "/profile/selected-address",
            Some(json!({"address_id": "nope"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["selected_address"]["label"], json!("Home"));
}

#[tokio::test]
async fn test_pinned_location_uses_geocoded_address() {
    let ctx = TestContext::new();
    ctx.geocoder.answer_with("Lalbagh Rd, Bengaluru, Karnataka");

    let (status, address) = ctx
        .send(
            Method::POST,
            "/profile/addresses",
            Some(json!({"lat": 12.95, "lng": 77.58})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(address["label"], json!("Lalbagh Rd"));
    assert_eq!(address["details"], json!("Lalbagh Rd, Bengaluru, Karnataka"));
}

#[tokio::test]
async fn test_pinned_location_is_kept_when_geocoder_fails() {
    let ctx = TestContext::new();

    let (status, address) = ctx
        .send(
            Method::POST,
            "/profile/addresses",
            Some(json!({"lat": 12.5, "lng": 77.25})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(address["label"], json!("Address not available"));
    assert_eq!(address["details"], json!("Address not available"));

    let (_, profile) = ctx.send(Method::GET, "/profile", None).await;
    assert_eq!(profile["selected_address"], address);
}

#[tokio::test]
async fn test_pinned_location_out_of_range() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .send(
            Method::POST,
            "/profile/addresses",
            Some(json!({"lat": 123.0, "lng": 77.0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.geocoder.calls(), 0);
}

#[tokio::test]
async fn test_profile_update_requires_login() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .send(Method::PATCH, "/profile", Some(json!({"name": "Asha"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_writes_backend_then_local() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;

    let (status, profile) = ctx
        .send(
            Method::PATCH,
            "/profile",
            Some(json!({"phone": " +919822222222 ", "email": "Asha@Example.IN"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["phone"], json!("+919822222222"));
    assert_eq!(profile["email"], json!("Asha@example.in"));
    assert_eq!(profile["name"], json!("Asha"));

    let merges = ctx.profiles.merges();
    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0].0.as_str(), "u-asha");
}

#[tokio::test]
async fn test_profile_update_backend_failure_keeps_local_state() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;
    ctx.profiles.set_failing(true);

    let (status, _) = ctx
        .send(Method::PATCH, "/profile", Some(json!({"name": "Someone Else"})))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, profile) = ctx.send(Method::GET, "/profile", None).await;
    assert_eq!(profile["name"], json!("Asha"));
}

#[tokio::test]
async fn test_profile_update_rejects_bad_email() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;

    let (status, _) = ctx
        .send(Method::PATCH, "/profile", Some(json!({"email": "not-an-email"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(ctx.profiles.merges().is_empty());
}

// ============================================================================
// Locations
// ============================================================================

#[tokio::test]
async fn test_lookup_respects_cooldown() {
    let ctx = TestContext::with_cooldown(Duration::from_secs(60));
    ctx.geocoder.answer_with("12 Green St, Springfield");
    let spot = json!({"lat": 12.97, "lng": 77.59});

    let (_, first) = ctx
        .send(Method::POST, "/locations/lookup", Some(spot.clone()))
        .await;
    assert_eq!(
        first,
        json!({"status": "resolved", "details": "12 Green St, Springfield"})
    );

    let (_, second) = ctx.send(Method::POST, "/locations/lookup", Some(spot)).await;
    assert_eq!(second, json!({"status": "skipped"}));
    assert_eq!(ctx.geocoder.calls(), 1);
}

#[tokio::test]
async fn test_pinned_address_inside_cooldown_keeps_coordinates() {
    let ctx = TestContext::with_cooldown(Duration::from_secs(60));
    ctx.geocoder.answer_with("Somewhere, Town");

    ctx.send(
        Method::POST,
        "/locations/lookup",
        Some(json!({"lat": 12.97, "lng": 77.59})),
    )
    .await;
    let (status, address) = ctx
        .send(
            Method::POST,
            "/profile/addresses",
            Some(json!({"lat": 12.5, "lng": 77.25})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(address["label"], json!("Selected location"));
    assert_eq!(address["details"], json!("12.5, 77.25"));
    assert_eq!(ctx.geocoder.calls(), 1);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_orders_require_login() {
    let ctx = TestContext::new();
    let (status, _) = ctx.send(Method::GET, "/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_orders_are_mine_and_newest_first() {
    let ctx = TestContext::new();
    ctx.orders.push(order("o-old", "u-asha", Some(1_700_000_000)));
    ctx.orders.push(order("o-other", "u-ravi", Some(1_800_000_000)));
    ctx.orders.push(order("o-undated", "u-asha", None));
    ctx.orders.push(order("o-new", "u-asha", Some(1_750_000_000)));
    ctx.sign_in(asha()).await;

    let (status, body) = ctx.send(Method::GET, "/orders", None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body
        .as_array()
        .map(|orders| orders.iter().filter_map(|o| o["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, ["o-new", "o-old", "o-undated"]);
    assert_eq!(body[0]["status"], json!("Processing"));
    assert_eq!(body[0]["total_display"], json!("₹120"));
}

#[tokio::test]
async fn test_orders_backend_failure_shows_empty_history() {
    let ctx = TestContext::new();
    ctx.sign_in(asha()).await;
    ctx.orders.set_failing(true);

    let (status, body) = ctx.send(Method::GET, "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
