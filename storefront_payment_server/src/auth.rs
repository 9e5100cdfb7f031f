//! Caller identity for the storefront endpoints.
//!
//! Customers authenticate with a compact HMAC-signed access token in the `sfg_access_token` header, issued by the
//! storefront's identity service with the same key this server is configured with. The server only *verifies*
//! tokens; how customers obtain them is not this service's concern.
//!
//! Two extractors are provided:
//! * [`AccessTokenClaims`] — requires a valid token and fails the request otherwise.
//! * [`CallerIdentity`] — maps "no token" to [`CallerIdentity::Anonymous`], so that endpoints open to guests (order
//!   submission) can branch on an explicit variant instead of sniffing the request.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sfg_common::Secret;
use sha2::Sha256;
use storefront_payment_engine::db_types::{Role, Roles};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_TOKEN_HEADER: &str = "sfg_access_token";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub customer_id: i64,
    pub email: String,
    pub roles: Roles,
    pub expires_at: DateTime<Utc>,
}

impl AccessTokenClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// The identity attached to a request. Selected by an explicit predicate: a valid access token yields `Customer`,
/// no token at all yields `Anonymous`, and a present-but-invalid token fails the request.
#[derive(Debug, Clone)]
pub enum CallerIdentity {
    Customer(AccessTokenClaims),
    Anonymous,
}

pub struct TokenIssuer {
    key: Secret<String>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: config.token_key.clone() }
    }

    /// Issue a signed access token for the given claims. This method DOES NOT check that the claims are
    /// legitimate; that is the identity service's job before it calls here.
    pub fn issue_token(&self, claims: &AccessTokenClaims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let payload = base64::encode_config(payload, base64::URL_SAFE_NO_PAD);
        let signature = sign_token_payload(self.key.reveal(), &payload);
        Ok(format!("{payload}.{signature}"))
    }

    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| AuthError::PoorlyFormattedToken("The signature separator is missing.".to_string()))?;
        let expected = sign_token_payload(self.key.reveal(), payload);
        if signature != expected {
            return Err(AuthError::ValidationError("The signature does not match the payload.".to_string()));
        }
        let claims = base64::decode_config(payload, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let claims: AccessTokenClaims =
            serde_json::from_slice(&claims).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        if claims.expires_at < Utc::now() {
            return Err(AuthError::ValidationError("The token has expired.".to_string()));
        }
        Ok(claims)
    }
}

fn sign_token_payload(key: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn claims_from_request(req: &HttpRequest) -> Result<Option<AccessTokenClaims>, ServerError> {
    let value = match req.headers().get(AUTH_TOKEN_HEADER) {
        Some(value) => value,
        None => return Ok(None),
    };
    let token = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("The token issuer has not been configured.".to_string()))?;
    let claims = issuer.validate_token(token)?;
    Ok(Some(claims))
}

impl FromRequest for AccessTokenClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req).and_then(|claims| claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken))))
    }
}

impl FromRequest for CallerIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            claims_from_request(req)
                .map(|claims| claims.map(CallerIdentity::Customer).unwrap_or(CallerIdentity::Anonymous)),
        )
    }
}
