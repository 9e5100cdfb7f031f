//! Stripe webhook plumbing: signature verification over the raw payload bytes, and event payload parsing.
//!
//! Stripe signs each webhook delivery with a `Stripe-Signature` header of the form
//! `t=<unix timestamp>,v1=<hex hmac-sha256>`, where the signed message is `"{t}.{raw body}"` and the key is the
//! endpoint's webhook secret. The timestamp bounds replay of old, legitimately signed deliveries.
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("Invalid signature. {0}")]
    InvalidSignature(String),
    #[error("Invalid payload. {0}")]
    InvalidPayload(String),
}

/// Verifies a `Stripe-Signature` header against the raw request body. Any one matching `v1` candidate is
/// sufficient (the header carries several while a secret is being rotated).
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    tolerance: Duration,
) -> Result<(), WebhookError> {
    let (timestamp, candidates) = parse_signature_header(header)?;
    let age = Utc::now().timestamp() - timestamp;
    if age.abs() > tolerance.num_seconds() {
        return Err(WebhookError::InvalidSignature(format!(
            "The signature timestamp is outside the {}s tolerance.",
            tolerance.num_seconds()
        )));
    }
    let expected = sign_payload(secret, timestamp, payload);
    if candidates.iter().any(|candidate| *candidate == expected) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature("No v1 signature matched the payload.".to_string()))
    }
}

pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn parse_signature_header(header: &str) -> Result<(i64, Vec<String>), WebhookError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for element in header.split(',') {
        match element.trim().split_once('=') {
            Some(("t", value)) => {
                let parsed = value.parse::<i64>().map_err(|e| {
                    WebhookError::InvalidSignature(format!("Bad timestamp in signature header: {e}"))
                })?;
                timestamp = Some(parsed);
            },
            Some(("v1", value)) => candidates.push(value.to_string()),
            // Stripe may introduce new signature schemes alongside v1.
            _ => {},
        }
    }
    let timestamp =
        timestamp.ok_or_else(|| WebhookError::InvalidSignature("No timestamp in signature header.".to_string()))?;
    if candidates.is_empty() {
        return Err(WebhookError::InvalidSignature("No v1 signatures in signature header.".to_string()));
    }
    Ok((timestamp, candidates))
}

//--------------------------------------     WebhookEvent     ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    /// The payment identifier the event refers to. Must match a stored payment reference.
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PaymentSucceeded,
    PaymentFailed,
    /// Event types this server does not act on. They are acknowledged so the provider stops redelivering them.
    Other,
}

impl WebhookEvent {
    pub fn from_payload(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            EVENT_PAYMENT_SUCCEEDED => EventKind::PaymentSucceeded,
            EVENT_PAYMENT_FAILED => EventKind::PaymentFailed,
            _ => EventKind::Other,
        }
    }

    pub fn payment_id(&self) -> &str {
        &self.data.object.id
    }
}
