use thiserror::Error;

use crate::{
    db_types::{CartLine, FulfilmentStatus, NewOrder, Order, Payment, PaymentRef, PaymentStatus},
    traits::{data_objects::PaymentUpdate, OrderApiError, OrderManagement},
};

/// This trait defines the write-side behaviour for backends supporting the storefront payment engine:
///
/// * resolving a cart into priced line items,
/// * persisting order submissions and reconciling them with their payment record,
/// * applying asynchronous provider payment events,
/// * administrative fulfilment updates.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Resolves the cart's items against the product catalog. Items whose product no longer exists are returned
    /// with an empty unit price rather than being dropped, so callers can report them.
    ///
    /// An unknown cart id resolves to an empty list.
    async fn fetch_cart_lines(&self, cart_id: &str) -> Result<Vec<CartLine>, PaymentGatewayError>;

    /// Persists a new order in a single atomic transaction:
    /// * the order row and its line items are inserted, with the total derived from the items,
    /// * the source cart is consumed,
    /// * payment reconciliation runs for the new order. `payment_ref` is used only if the create branch is taken.
    ///
    /// Returns the persisted order and its resolved payment.
    async fn process_order_submission(
        &self,
        order: NewOrder,
        payment_ref: PaymentRef,
    ) -> Result<(Order, Payment), PaymentGatewayError>;

    /// Runs payment reconciliation for an existing order, in a single atomic transaction:
    /// * no payment yet: create one with status `Pending`, amount equal to the order total, and `payment_ref` as
    ///   its external reference,
    /// * existing payment with status `Completed`: fail with [`PaymentGatewayError::DuplicatePayment`],
    /// * existing payment with status `Pending` or `Failed`: reset that same record to `Pending`, keeping its id
    ///   and reference.
    ///
    /// A concurrent submission racing the create branch trips the unique constraint on the payment's order id; the
    /// implementation must treat that as "payment already exists" and fall back to the reuse path.
    async fn reconcile_payment(&self, order_id: i64, payment_ref: PaymentRef) -> Result<Payment, PaymentGatewayError>;

    /// Applies a provider payment event to the payment identified by `payment_ref`, and atomically mirrors the new
    /// status onto the owning order. Applying the payment's current status again is a no-op, as is any transition
    /// out of `Completed`; both are reported through [`PaymentUpdate::changed`].
    async fn update_payment_status(
        &self,
        payment_ref: &PaymentRef,
        status: PaymentStatus,
    ) -> Result<PaymentUpdate, PaymentGatewayError>;

    /// Fetches the payment for the given order, if one has been created.
    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, PaymentGatewayError>;

    /// Sets the vendor-side fulfilment status for an order. The payment status is not touched.
    async fn set_fulfilment_status(
        &self,
        order_id: i64,
        status: FulfilmentStatus,
    ) -> Result<Order, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("Invalid order submission. {0}")]
    ValidationError(String),
    #[error("Payment for order #{0} has already been completed.")]
    DuplicatePayment(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("No payment exists with reference {0}")]
    PaymentNotFound(PaymentRef),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}

impl From<OrderApiError> for PaymentGatewayError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(e) => PaymentGatewayError::DatabaseError(e),
        }
    }
}
