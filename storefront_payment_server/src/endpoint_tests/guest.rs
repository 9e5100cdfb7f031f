use actix_web::{http::StatusCode, web, web::ServiceConfig};
use sfg_common::Money;
use serde_json::{json, Value};
use storefront_payment_engine::{db_types::OrderItem, OrderFlowApi};

use super::{
    helpers::{order_fixture, post_json},
    mocks::MockCheckoutDb,
};
use crate::routes::GuestOrderLookupRoute;

fn register(cfg: &mut ServiceConfig, db: MockCheckoutDb) {
    cfg.service(GuestOrderLookupRoute::<MockCheckoutDb>::new()).app_data(web::Data::new(OrderFlowApi::new(db)));
}

#[actix_web::test]
async fn matching_email_returns_the_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_json(
        None,
        "/orders/guest-lookup",
        json!({"order_id": 1, "email": "carol@example.com"}),
        configure_lookup,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).expect("Response should be JSON");
    assert_eq!(body["order"]["id"], 1);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn wrong_email_and_missing_order_are_indistinguishable() {
    let _ = env_logger::try_init().ok();
    let wrong_email = post_json(
        None,
        "/orders/guest-lookup",
        json!({"order_id": 1, "email": "mallory@example.com"}),
        configure_lookup,
    )
    .await;
    let missing_order = post_json(
        None,
        "/orders/guest-lookup",
        json!({"order_id": 999, "email": "carol@example.com"}),
        configure_lookup,
    )
    .await;
    assert_eq!(wrong_email.0, StatusCode::NOT_FOUND);
    assert_eq!(wrong_email.1, r#"{"error":"Order not found or email does not match."}"#);
    // Identical response shape either way; nothing leaks about which part was wrong.
    assert_eq!(wrong_email, missing_order);
}

fn configure_lookup(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_order_for_guest().returning(|order_id, email| {
        if order_id == 1 && email == "carol@example.com" {
            Ok(Some(order_fixture(1, None, email, 1999)))
        } else {
            Ok(None)
        }
    });
    db.expect_fetch_order_items().returning(|order_id| {
        Ok(vec![OrderItem { id: 1, order_id, product_id: 5, quantity: 1, unit_price: Money::from_cents(1999) }])
    });
    register(cfg, db);
}
