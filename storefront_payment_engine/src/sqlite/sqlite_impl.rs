//! `SqliteDatabase` is a concrete implementation of a storefront payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sfg_common::Money;
use sqlx::SqlitePool;

use super::db::{catalog, db_url, new_pool, orders, payments};
use crate::{
    db_types::{
        CartLine,
        FulfilmentStatus,
        NewOrder,
        Order,
        OrderItem,
        Payment,
        PaymentRef,
        PaymentStatus,
        Product,
    },
    traits::{CheckoutDatabase, OrderApiError, OrderManagement, PaymentGatewayError, PaymentUpdate},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool for the database at the url given by the `SFG_DATABASE_URL` environment
    /// variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ----- Catalog seeding helpers. The storefront manages its catalog elsewhere; these exist for tooling and
    // ----- tests that need products and carts to check out with.

    pub async fn add_product(&self, title: &str, unit_price: Money) -> Result<Product, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let product = catalog::insert_product(title, unit_price, &mut conn).await?;
        Ok(product)
    }

    pub async fn remove_product(&self, product_id: i64) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        catalog::delete_product(product_id, &mut conn).await?;
        Ok(())
    }

    pub async fn create_cart(&self, cart_id: &str) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        catalog::create_cart(cart_id, &mut conn).await?;
        Ok(())
    }

    pub async fn set_cart_item(
        &self,
        cart_id: &str,
        product_id: i64,
        quantity: i64,
    ) -> Result<(), PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        catalog::set_cart_item(cart_id, product_id, quantity, &mut conn).await?;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_customer(customer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_all_orders(&mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_for_guest(&self, order_id: i64, email: &str) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_for_guest(order_id, email, &mut conn).await?;
        Ok(order)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_cart_lines(&self, cart_id: &str) -> Result<Vec<CartLine>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let lines = catalog::fetch_cart_lines(cart_id, &mut conn).await?;
        Ok(lines)
    }

    async fn process_order_submission(
        &self,
        order: NewOrder,
        payment_ref: PaymentRef,
    ) -> Result<(Order, Payment), PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let cart_id = order.cart_id.clone();
        let order = orders::insert_order(order, &mut tx).await?;
        catalog::delete_cart(&cart_id, &mut tx).await?;
        let payment = payments::reconcile(order.id, order.total_price, payment_ref, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} has been saved in the DB with payment {}", order.id, payment.payment_ref);
        Ok((order, payment))
    }

    async fn reconcile_payment(
        &self,
        order_id: i64,
        payment_ref: PaymentRef,
    ) -> Result<Payment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderNotFound(order_id))?;
        let payment = payments::reconcile(order.id, order.total_price, payment_ref, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment {} reconciled for order #{}", payment.payment_ref, order.id);
        Ok(payment)
    }

    async fn update_payment_status(
        &self,
        payment_ref: &PaymentRef,
        status: PaymentStatus,
    ) -> Result<PaymentUpdate, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment_by_ref(payment_ref, &mut tx)
            .await?
            .ok_or_else(|| PaymentGatewayError::PaymentNotFound(payment_ref.clone()))?;
        let order = orders::fetch_order_by_id(payment.order_id, &mut tx)
            .await?
            .ok_or(PaymentGatewayError::OrderNotFound(payment.order_id))?;
        if payment.status == status {
            debug!("🗃️ Payment {payment_ref} is already {status}. Nothing to do.");
            return Ok(PaymentUpdate { payment, order, changed: false });
        }
        if payment.status == PaymentStatus::Completed {
            // Completed is terminal. The provider can deliver events out of order; don't let a stale failure
            // claw back a confirmed payment.
            warn!("🗃️ Ignoring {status} event for completed payment {payment_ref}");
            return Ok(PaymentUpdate { payment, order, changed: false });
        }
        let payment = payments::set_status(payment.id, status, &mut tx).await?;
        let order = orders::set_payment_status(payment.order_id, status, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment {payment_ref} and order #{} are now {status}", order.id);
        Ok(PaymentUpdate { payment, order, changed: true })
    }

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn set_fulfilment_status(
        &self,
        order_id: i64,
        status: FulfilmentStatus,
    ) -> Result<Order, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::set_fulfilment_status(order_id, status, &mut conn).await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
