use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{FulfilmentStatus, NewOrder, Order, OrderItem, PaymentStatus},
    traits::PaymentGatewayError,
};

/// Inserts a new order and its line items using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let total = order.total_price();
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (customer_id, email, total_price) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order.customer_id)
    .bind(&order.email)
    .bind(total.value())
    .fetch_one(&mut *conn)
    .await?;
    for item in &order.items {
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
            .bind(inserted.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price.value())
            .execute(&mut *conn)
            .await?;
    }
    debug!("📝️ Order #{} inserted with {} line items, total {total}", inserted.id, order.items.len());
    Ok(inserted)
}

pub async fn fetch_order_by_id(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the order only if the stored contact email matches exactly. A wrong email is indistinguishable from an
/// unknown order id.
pub async fn fetch_order_for_guest(
    order_id: i64,
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND email = $2")
        .bind(order_id)
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_orders_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at ASC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_all_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders ORDER BY created_at ASC").fetch_all(conn).await?;
    Ok(orders)
}

/// Mirrors a payment status change onto the owning order. Only webhook ingestion calls this.
pub(crate) async fn set_payment_status(
    order_id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    result.ok_or(PaymentGatewayError::OrderNotFound(order_id))
}

pub(crate) async fn set_fulfilment_status(
    order_id: i64,
    status: FulfilmentStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET fulfilment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.to_string())
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    result.ok_or(PaymentGatewayError::OrderNotFound(order_id))
}
