use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Days, TimeZone, Utc};
use sfg_common::{Money, Secret};
use serde_json::Value;
use storefront_payment_engine::db_types::{
    FulfilmentStatus,
    Order,
    Payment,
    PaymentMethod,
    PaymentRef,
    PaymentStatus,
    Roles,
};

use crate::{
    auth::{AccessTokenClaims, TokenIssuer, AUTH_TOKEN_HEADER},
    config::AuthConfig,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this key anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { token_key: Secret::new("endpoint-test-token-key-000000000000000000000001".to_string()) }
}

pub fn issue_token(claims: &AccessTokenClaims) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(claims).expect("Failed to issue token")
}

pub fn customer_claims(customer_id: i64, email: &str, roles: Roles) -> AccessTokenClaims {
    AccessTokenClaims {
        customer_id,
        email: email.to_string(),
        roles,
        expires_at: Utc::now() + Days::new(1),
    }
}

pub fn order_fixture(id: i64, customer_id: Option<i64>, email: &str, total_cents: i64) -> Order {
    let stamp = Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap();
    Order {
        id,
        customer_id,
        email: email.to_string(),
        total_price: Money::from_cents(total_cents),
        payment_status: PaymentStatus::Pending,
        fulfilment_status: FulfilmentStatus::Pending,
        created_at: stamp,
        updated_at: stamp,
    }
}

pub fn payment_fixture(id: i64, order_id: i64, total_cents: i64, status: PaymentStatus) -> Payment {
    let stamp = Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap();
    Payment {
        id,
        order_id,
        payment_ref: PaymentRef::from(format!("pay-{order_id:016x}")),
        amount: Money::from_cents(total_cents),
        method: PaymentMethod::Stripe,
        status,
        created_at: stamp,
        updated_at: stamp,
    }
}

async fn call(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().app_data(web::Data::new(TokenIssuer::new(&get_auth_config()))).configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn get_request(token: &str, path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    if !token.is_empty() {
        req = req.insert_header((AUTH_TOKEN_HEADER, token));
    }
    call(req, configure).await
}

pub async fn post_json(
    token: Option<&str>,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if let Some(token) = token {
        req = req.insert_header((AUTH_TOKEN_HEADER, token));
    }
    call(req, configure).await
}

pub async fn patch_json(
    token: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = TestRequest::patch().uri(path).set_json(body).insert_header((AUTH_TOKEN_HEADER, token));
    call(req, configure).await
}

pub async fn post_raw(
    path: &str,
    body: Vec<u8>,
    headers: Vec<(&'static str, String)>,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).set_payload(body);
    for (name, value) in headers {
        req = req.insert_header((name, value));
    }
    call(req, configure).await
}
