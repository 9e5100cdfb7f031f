use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use sfg_common::Secret;
use storefront_payment_engine::{
    db_types::{PaymentRef, PaymentStatus},
    OrderFlowApi,
    PaymentGatewayError,
    PaymentUpdate,
};

use super::{
    helpers::{order_fixture, payment_fixture, post_raw},
    mocks::MockCheckoutDb,
};
use crate::{
    config::StripeConfig,
    integrations::stripe::{sign_payload, SIGNATURE_HEADER},
    webhook_routes::StripeWebhookRoute,
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_test_secret";

fn succeeded_event(payment_ref: &str) -> Vec<u8> {
    format!(r#"{{"type":"payment_intent.succeeded","data":{{"object":{{"id":"{payment_ref}"}}}}}}"#).into_bytes()
}

fn signature_for(payload: &[u8]) -> (&'static str, String) {
    let timestamp = Utc::now().timestamp();
    (SIGNATURE_HEADER, format!("t={timestamp},v1={}", sign_payload(WEBHOOK_SECRET, timestamp, payload)))
}

fn register(cfg: &mut ServiceConfig, db: MockCheckoutDb) {
    let stripe = StripeConfig {
        webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
        signature_checks: true,
        signature_tolerance: Duration::minutes(5),
    };
    cfg.service(StripeWebhookRoute::<MockCheckoutDb>::new())
        .app_data(web::Data::new(OrderFlowApi::new(db)))
        .app_data(web::Data::new(stripe));
}

#[actix_web::test]
async fn signed_success_event_completes_payment() {
    let _ = env_logger::try_init().ok();
    let payload = succeeded_event("pay-0001");
    let header = signature_for(&payload);
    let (status, body) = post_raw("/webhook/stripe", payload, vec![header], configure_confirmation).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"success"}"#);
}

fn configure_confirmation(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_update_payment_status()
        .withf(|payment_ref, status| payment_ref == &PaymentRef::from("pay-0001") && *status == PaymentStatus::Completed)
        .returning(|payment_ref, status| {
            let mut payment = payment_fixture(1, 1, 4999, status);
            payment.payment_ref = payment_ref.clone();
            let mut order = order_fixture(1, Some(42), "alice@example.com", 4999);
            order.payment_status = status;
            Ok(PaymentUpdate { payment, order, changed: true })
        });
    register(cfg, db);
}

#[actix_web::test]
async fn unsigned_event_mutates_nothing() {
    let _ = env_logger::try_init().ok();
    // No expectations are set on the mock: any backend call panics the test.
    let payload = succeeded_event("pay-0001");
    let (status, body) = post_raw("/webhook/stripe", payload, vec![], configure_untouched_backend).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid signature. No signature header found in request."}"#);
}

#[actix_web::test]
async fn badly_signed_event_mutates_nothing() {
    let _ = env_logger::try_init().ok();
    let payload = succeeded_event("pay-0001");
    let timestamp = Utc::now().timestamp();
    let header =
        (SIGNATURE_HEADER, format!("t={timestamp},v1={}", sign_payload("not_the_secret", timestamp, &payload)));
    let (status, body) = post_raw("/webhook/stripe", payload, vec![header], configure_untouched_backend).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Invalid signature."#), "unexpected body: {body}");
}

fn configure_untouched_backend(cfg: &mut ServiceConfig) {
    register(cfg, MockCheckoutDb::new());
}

#[actix_web::test]
async fn signed_garbage_is_an_invalid_payload() {
    let _ = env_logger::try_init().ok();
    let payload = b"not a provider event".to_vec();
    let header = signature_for(&payload);
    let (status, body) = post_raw("/webhook/stripe", payload, vec![header], configure_untouched_backend).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Invalid payload."#), "unexpected body: {body}");
}

#[actix_web::test]
async fn unknown_event_kinds_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let payload = br#"{"type":"customer.subscription.updated","data":{"object":{"id":"sub-1"}}}"#.to_vec();
    let header = signature_for(&payload);
    let (status, body) = post_raw("/webhook/stripe", payload, vec![header], configure_untouched_backend).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"success"}"#);
}

#[actix_web::test]
async fn replayed_event_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let payload = succeeded_event("pay-0001");
    let header = signature_for(&payload);
    let (status, body) = post_raw("/webhook/stripe", payload, vec![header], configure_replay).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"success"}"#);
}

fn configure_replay(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_update_payment_status().returning(|payment_ref, status| {
        let mut payment = payment_fixture(1, 1, 4999, status);
        payment.payment_ref = payment_ref.clone();
        let mut order = order_fixture(1, Some(42), "alice@example.com", 4999);
        order.payment_status = status;
        Ok(PaymentUpdate { payment, order, changed: false })
    });
    register(cfg, db);
}

#[actix_web::test]
async fn unknown_payment_reference_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let payload = succeeded_event("pay-unknown");
    let header = signature_for(&payload);
    let (status, body) = post_raw("/webhook/stripe", payload, vec![header], configure_desync).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("out of sync"), "unexpected body: {body}");
}

fn configure_desync(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_update_payment_status()
        .returning(|payment_ref, _| Err(PaymentGatewayError::PaymentNotFound(payment_ref.clone())));
    register(cfg, db);
}
