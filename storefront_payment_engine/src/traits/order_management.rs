use thiserror::Error;

use crate::db_types::{Order, OrderItem};

/// Read-side order queries shared by the customer-facing views and the guest lookup flow.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderApiError>;

    /// The order's line items, in the sequence they were captured at submission.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError>;

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError>;

    /// All orders in the store, newest last. Admin-only callers.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderApiError>;

    /// Fetches an order only if the stored contact email matches `email` exactly. A wrong email and an unknown
    /// order id are indistinguishable to the caller.
    async fn fetch_order_for_guest(&self, order_id: i64, email: &str) -> Result<Option<Order>, OrderApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}
