use actix_web::{http::StatusCode, web, web::ServiceConfig};
use sfg_common::Money;
use serde_json::{json, Value};
use storefront_payment_engine::{
    db_types::{CartLine, PaymentStatus, Role},
    OrderFlowApi,
    PaymentGatewayError,
};

use super::{
    helpers::{customer_claims, get_request, issue_token, order_fixture, patch_json, payment_fixture, post_json},
    mocks::MockCheckoutDb,
};
use crate::routes::{MyOrdersRoute, OrderByIdRoute, SubmitOrderRoute, UpdateFulfilmentRoute};

fn register(cfg: &mut ServiceConfig, db: MockCheckoutDb) {
    cfg.service(SubmitOrderRoute::<MockCheckoutDb>::new())
        .service(MyOrdersRoute::<MockCheckoutDb>::new())
        .service(OrderByIdRoute::<MockCheckoutDb>::new())
        .service(UpdateFulfilmentRoute::<MockCheckoutDb>::new())
        .app_data(web::Data::new(OrderFlowApi::new(db)));
}

fn cart_lines() -> Vec<CartLine> {
    vec![
        CartLine { product_id: 1, quantity: 2, unit_price: Some(Money::from_cents(1500)) },
        CartLine { product_id: 2, quantity: 1, unit_price: Some(Money::from_cents(1999)) },
    ]
}

#[actix_web::test]
async fn authenticated_submission_returns_created_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(42, "alice@example.com", vec![Role::Customer]));
    let (status, body) =
        post_json(Some(&token), "/orders", json!({"cart_id": "cart-1"}), configure_submission_happy_path).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).expect("Response should be JSON");
    assert_eq!(body["order"]["id"], 1);
    assert_eq!(body["order"]["customer_id"], 42);
    assert_eq!(body["order"]["total_price"], 4999);
    assert_eq!(body["payment"]["status"], "Pending");
    assert_eq!(body["payment"]["amount"], 4999);
}

fn configure_submission_happy_path(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_cart_lines().withf(|cart_id| cart_id == "cart-1").returning(|_| Ok(cart_lines()));
    db.expect_process_order_submission().withf(|order, _| order.customer_id == Some(42)).returning(|order, _| {
        let persisted = order_fixture(1, order.customer_id, &order.email, order.total_price().value());
        let payment = payment_fixture(1, 1, order.total_price().value(), PaymentStatus::Pending);
        Ok((persisted, payment))
    });
    register(cfg, db);
}

#[actix_web::test]
async fn guest_submission_without_email_is_rejected() {
    let _ = env_logger::try_init().ok();
    // The backend is never reached; any mock call would panic the test.
    let (status, body) = post_json(None, "/orders", json!({"cart_id": "cart-1"}), configure_no_calls).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"A contact email is required for guest orders."}"#);
}

fn configure_no_calls(cfg: &mut ServiceConfig) {
    register(cfg, MockCheckoutDb::new());
}

#[actix_web::test]
async fn guest_submission_creates_unbound_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_json(
        None,
        "/orders",
        json!({"cart_id": "cart-1", "email": "bob@example.com"}),
        configure_guest_submission,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).expect("Response should be JSON");
    assert_eq!(body["order"]["customer_id"], Value::Null);
    assert_eq!(body["order"]["email"], "bob@example.com");
}

fn configure_guest_submission(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_cart_lines().returning(|_| Ok(cart_lines()));
    db.expect_process_order_submission()
        .withf(|order, _| order.customer_id.is_none() && order.email == "bob@example.com")
        .returning(|order, _| {
            let persisted = order_fixture(7, None, &order.email, order.total_price().value());
            let payment = payment_fixture(7, 7, order.total_price().value(), PaymentStatus::Pending);
            Ok((persisted, payment))
        });
    register(cfg, db);
}

#[actix_web::test]
async fn retry_against_completed_payment_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(42, "alice@example.com", vec![Role::Customer]));
    let (status, body) = post_json(Some(&token), "/orders", json!({"order_id": 1}), configure_completed_retry).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payment for order #1 has already been completed."}"#);
}

fn configure_completed_retry(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_order_by_id()
        .returning(|id| Ok(Some(order_fixture(id, Some(42), "alice@example.com", 4999))));
    db.expect_reconcile_payment().returning(|id, _| Err(PaymentGatewayError::DuplicatePayment(id)));
    register(cfg, db);
}

#[actix_web::test]
async fn fetch_my_orders_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders", configure_no_calls).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. An access token is required for this endpoint."}"#);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(42, "alice@example.com", vec![Role::Customer]));
    let (status, body) = get_request(&token, "/orders", configure_my_orders).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).expect("Response should be JSON");
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

fn configure_my_orders(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_orders_for_customer().withf(|id| *id == 42).returning(|id| {
        Ok(vec![
            order_fixture(1, Some(id), "alice@example.com", 4999),
            order_fixture(2, Some(id), "alice@example.com", 1000),
        ])
    });
    register(cfg, db);
}

#[actix_web::test]
async fn admins_see_all_orders() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(1, "admin@example.com", vec![Role::Admin]));
    let (status, body) = get_request(&token, "/orders", configure_all_orders).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).expect("Response should be JSON");
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

fn configure_all_orders(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_all_orders().returning(|| {
        Ok(vec![
            order_fixture(1, Some(42), "alice@example.com", 4999),
            order_fixture(2, Some(43), "bob@example.com", 1000),
            order_fixture(3, None, "carol@example.com", 500),
        ])
    });
    register(cfg, db);
}

#[actix_web::test]
async fn foreign_order_is_indistinguishable_from_missing() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(43, "bob@example.com", vec![Role::Customer]));
    let (status, body) = get_request(&token, "/orders/1", configure_order_details).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Order not found."}"#);
}

fn configure_order_details(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_order_by_id().returning(|id| Ok(Some(order_fixture(id, Some(42), "alice@example.com", 4999))));
    db.expect_fetch_order_items().returning(|_| Ok(vec![]));
    register(cfg, db);
}

#[actix_web::test]
async fn fulfilment_update_requires_vendor_role() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(42, "alice@example.com", vec![Role::Customer]));
    let (status, body) =
        patch_json(&token, "/orders/1/fulfilment", json!({"status": "Shipped"}), configure_no_calls).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. Only vendors and admins may update fulfilment status."}"#);
}

#[actix_web::test]
async fn invalid_fulfilment_status_is_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(9, "vendor@example.com", vec![Role::Vendor]));
    let (status, body) =
        patch_json(&token, "/orders/1/fulfilment", json!({"status": "Teleported"}), configure_no_calls).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid fulfilment status: Teleported"}"#);
}

#[actix_web::test]
async fn vendors_can_update_fulfilment() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&customer_claims(9, "vendor@example.com", vec![Role::Vendor]));
    let (status, body) =
        patch_json(&token, "/orders/1/fulfilment", json!({"status": "Shipped"}), configure_fulfilment_update).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).expect("Response should be JSON");
    assert_eq!(body["fulfilment_status"], "Shipped");
}

fn configure_fulfilment_update(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_set_fulfilment_status().returning(|id, status| {
        let mut order = order_fixture(id, Some(42), "alice@example.com", 4999);
        order.fulfilment_status = status;
        Ok(order)
    });
    register(cfg, db);
}
