use serde::{Deserialize, Serialize};

/// The order submission payload. `cart_id` names the cart to build a new order from; `order_id` instead names an
/// existing order to retry payment for. `email` is only required (and only used) for guest submissions —
/// authenticated callers are identified by their access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    #[serde(default)]
    pub cart_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub order_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestOrderRequest {
    pub order_id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFulfilmentRequest {
    pub status: String,
}
