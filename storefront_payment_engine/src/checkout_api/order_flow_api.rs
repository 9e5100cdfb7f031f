use std::fmt::Debug;

use log::*;

use crate::{
    checkout_api::order_objects::{CheckoutResult, OrderSubmission, OrderWithItems},
    db_types::{FulfilmentStatus, NewOrder, NewOrderItem, Order, PaymentRef, PaymentStatus},
    traits::{CheckoutDatabase, OrderApiError, OrderManagement, PaymentGatewayError, PaymentUpdate},
};

/// `OrderFlowApi` is the primary API for handling order submissions and payment flows in response to storefront
/// checkouts and payment-provider events.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: CheckoutDatabase
{
    /// Submit an order on behalf of an authenticated customer or a guest.
    ///
    /// A submission without a retry target builds a new order from the named cart: the cart is resolved against
    /// the catalog, validated, persisted with its computed total, and handed to payment reconciliation, all before
    /// this call returns. A submission naming an existing order re-runs reconciliation for that order (the retry
    /// path), after checking that the order belongs to the submitter.
    ///
    /// Reconciliation resolves to exactly one of:
    ///
    /// | Existing payment | Outcome |
    /// |------------------|---------|
    /// | none             | new payment, status `Pending`, amount = order total |
    /// | `Completed`      | `Err(DuplicatePayment)` |
    /// | `Pending`/`Failed` | same payment record reset to `Pending` |
    pub async fn submit_order(&self, submission: OrderSubmission) -> Result<CheckoutResult, PaymentGatewayError> {
        match submission.retry_order_id() {
            Some(order_id) => self.retry_order_payment(order_id, &submission).await,
            None => self.place_new_order(&submission).await,
        }
    }

    async fn place_new_order(&self, submission: &OrderSubmission) -> Result<CheckoutResult, PaymentGatewayError> {
        let email = submission.email().trim();
        if email.is_empty() {
            return Err(PaymentGatewayError::ValidationError(
                "A contact email is required to place an order.".to_string(),
            ));
        }
        let cart_id = submission
            .cart_id()
            .ok_or_else(|| PaymentGatewayError::ValidationError("A cart is required to place an order.".to_string()))?;
        let lines = self.db.fetch_cart_lines(cart_id).await?;
        if lines.is_empty() {
            return Err(PaymentGatewayError::ValidationError("The cart is empty or does not exist.".to_string()));
        }
        let items = lines
            .into_iter()
            .map(|line| match line.unit_price {
                Some(unit_price) => {
                    Ok(NewOrderItem { product_id: line.product_id, quantity: line.quantity, unit_price })
                },
                None => Err(PaymentGatewayError::ValidationError(format!(
                    "Product {} is no longer available.",
                    line.product_id
                ))),
            })
            .collect::<Result<Vec<NewOrderItem>, PaymentGatewayError>>()?;
        let customer_id = match submission {
            OrderSubmission::Authenticated { customer_id, .. } => Some(*customer_id),
            OrderSubmission::Guest { .. } => None,
        };
        let mut order = NewOrder::new(customer_id, email.to_string(), cart_id.to_string());
        order.items = items;
        let (order, payment) = self.db.process_order_submission(order, PaymentRef::random()).await?;
        info!("🛒️ Order #{} submitted. Payment {} is {}.", order.id, payment.payment_ref, payment.status);
        Ok(CheckoutResult { order, payment })
    }

    async fn retry_order_payment(
        &self,
        order_id: i64,
        submission: &OrderSubmission,
    ) -> Result<CheckoutResult, PaymentGatewayError> {
        let order = self
            .db
            .fetch_order_by_id(order_id)
            .await?
            .ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        // An ownership mismatch is indistinguishable from a missing order.
        if !submission.owns(&order) {
            debug!("🛒️ Retry submission for order #{order_id} did not match the order's owner.");
            return Err(PaymentGatewayError::OrderNotFound(order_id));
        }
        let payment = self.db.reconcile_payment(order.id, PaymentRef::random()).await?;
        info!("🛒️ Payment retry for order #{}. Payment {} is {}.", order.id, payment.payment_ref, payment.status);
        Ok(CheckoutResult { order, payment })
    }

    /// Marks the payment identified by `payment_ref`, and its owning order, as `Completed`. This is driven by the
    /// provider's payment-succeeded webhook event. Replays are no-ops.
    pub async fn confirm_payment(&self, payment_ref: &PaymentRef) -> Result<PaymentUpdate, PaymentGatewayError> {
        trace!("💳️ Payment {payment_ref} is being marked as completed");
        let update = self.db.update_payment_status(payment_ref, PaymentStatus::Completed).await?;
        if update.changed {
            info!("💳️ Payment {payment_ref} completed. Order #{} is paid.", update.order.id);
        }
        Ok(update)
    }

    /// Marks the payment identified by `payment_ref`, and its owning order, as `Failed`. This is driven by the
    /// provider's payment-failed webhook event. Replays are no-ops, and completed payments are left untouched.
    pub async fn fail_payment(&self, payment_ref: &PaymentRef) -> Result<PaymentUpdate, PaymentGatewayError> {
        trace!("💳️ Payment {payment_ref} is being marked as failed");
        let update = self.db.update_payment_status(payment_ref, PaymentStatus::Failed).await?;
        if update.changed {
            info!("💳️ Payment {payment_ref} failed. Order #{} can be retried.", update.order.id);
        }
        Ok(update)
    }

    /// Guest order lookup: returns the order and its items only when the stored contact email matches the claim
    /// exactly. `None` covers both "no such order" and "wrong email".
    pub async fn order_for_guest(&self, order_id: i64, email: &str) -> Result<Option<OrderWithItems>, OrderApiError> {
        match self.db.fetch_order_for_guest(order_id, email).await? {
            Some(order) => {
                let items = self.db.fetch_order_items(order.id).await?;
                Ok(Some(OrderWithItems { order, items }))
            },
            None => Ok(None),
        }
    }

    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError> {
        self.db.fetch_orders_for_customer(customer_id).await
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, OrderApiError> {
        self.db.fetch_all_orders().await
    }

    /// Fetches an order with its items, without any ownership check. Callers enforce access control.
    pub async fn order_details(&self, order_id: i64) -> Result<Option<OrderWithItems>, OrderApiError> {
        match self.db.fetch_order_by_id(order_id).await? {
            Some(order) => {
                let items = self.db.fetch_order_items(order.id).await?;
                Ok(Some(OrderWithItems { order, items }))
            },
            None => Ok(None),
        }
    }

    pub async fn set_fulfilment_status(
        &self,
        order_id: i64,
        status: FulfilmentStatus,
    ) -> Result<Order, PaymentGatewayError> {
        let order = self.db.set_fulfilment_status(order_id, status).await?;
        info!("🛒️ Order #{} fulfilment status set to {status}", order.id);
        Ok(order)
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
