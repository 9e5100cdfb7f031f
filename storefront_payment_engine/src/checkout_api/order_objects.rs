use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, Payment};

/// An order submission, as handed to [`crate::OrderFlowApi::submit_order`].
///
/// The two variants are selected by an explicit predicate on the caller's identity at the request boundary: a
/// valid access token yields `Authenticated`, no token yields `Guest`. Both variants may name an existing order to
/// retry payment for, instead of a cart to build a new order from.
#[derive(Debug, Clone)]
pub enum OrderSubmission {
    Authenticated { customer_id: i64, email: String, cart_id: Option<String>, retry_order_id: Option<i64> },
    Guest { email: String, cart_id: Option<String>, retry_order_id: Option<i64> },
}

impl OrderSubmission {
    pub fn retry_order_id(&self) -> Option<i64> {
        match self {
            OrderSubmission::Authenticated { retry_order_id, .. } => *retry_order_id,
            OrderSubmission::Guest { retry_order_id, .. } => *retry_order_id,
        }
    }

    pub fn cart_id(&self) -> Option<&str> {
        match self {
            OrderSubmission::Authenticated { cart_id, .. } => cart_id.as_deref(),
            OrderSubmission::Guest { cart_id, .. } => cart_id.as_deref(),
        }
    }

    pub fn email(&self) -> &str {
        match self {
            OrderSubmission::Authenticated { email, .. } => email,
            OrderSubmission::Guest { email, .. } => email,
        }
    }

    /// True if the given order belongs to the submitter: customer id match for authenticated callers, exact
    /// contact email match for guests.
    pub fn owns(&self, order: &Order) -> bool {
        match self {
            OrderSubmission::Authenticated { customer_id, .. } => order.customer_id == Some(*customer_id),
            OrderSubmission::Guest { email, .. } => order.email == *email,
        }
    }
}

/// The result of a successful order submission: the persisted order and its resolved payment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub payment: Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
