use log::debug;
use sfg_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, PaymentRef, PaymentStatus},
    traits::PaymentGatewayError,
};

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_ref(
    payment_ref: &PaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE payment_ref = $1")
        .bind(payment_ref.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, payment_ref, amount, method, status) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.payment_ref.as_str())
    .bind(payment.amount.value())
    .bind(payment.method.to_string())
    .bind(PaymentStatus::Pending.to_string())
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub(crate) async fn set_status(
    id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Payment, PaymentGatewayError> {
    let payment: Payment =
        sqlx::query_as("UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status.to_string())
            .bind(id)
            .fetch_one(conn)
            .await?;
    Ok(payment)
}

/// Resolves the payment record for an order: create, reuse, or reject.
///
/// 1. No payment exists for the order: a new one is created with status `Pending`, `amount` as its amount and
///    `candidate_ref` as its external reference.
/// 2. A payment exists with status `Completed`: the submission is rejected with
///    [`PaymentGatewayError::DuplicatePayment`]. Nothing is written.
/// 3. A payment exists with status `Pending` or `Failed`: that same record is reset to `Pending` so the provider
///    can run a fresh attempt against the original reference.
///
/// Exactly one payment row is written on the non-rejecting paths. If a concurrent submission wins the create race,
/// the unique constraint on `payments.order_id` fires and this call falls back to the reuse path.
pub async fn reconcile(
    order_id: i64,
    amount: Money,
    candidate_ref: PaymentRef,
    conn: &mut SqliteConnection,
) -> Result<Payment, PaymentGatewayError> {
    match fetch_payment_for_order(order_id, &mut *conn).await? {
        Some(existing) => reuse_or_reject(existing, conn).await,
        None => {
            let payment = NewPayment::new(order_id, amount, candidate_ref);
            match insert_payment(payment, &mut *conn).await {
                Ok(payment) => {
                    debug!("💳️ Payment {} created for order #{order_id} ({amount})", payment.payment_ref);
                    Ok(payment)
                },
                Err(e) if is_unique_violation(&e) => {
                    // Lost the create race to a concurrent submission for the same order.
                    let existing = fetch_payment_for_order(order_id, &mut *conn).await?.ok_or_else(|| {
                        PaymentGatewayError::DatabaseError(format!(
                            "payment insert for order #{order_id} hit a unique violation but no payment row exists"
                        ))
                    })?;
                    reuse_or_reject(existing, conn).await
                },
                Err(e) => Err(e.into()),
            }
        },
    }
}

async fn reuse_or_reject(payment: Payment, conn: &mut SqliteConnection) -> Result<Payment, PaymentGatewayError> {
    match payment.status {
        PaymentStatus::Completed => Err(PaymentGatewayError::DuplicatePayment(payment.order_id)),
        PaymentStatus::Pending | PaymentStatus::Failed => {
            let payment = set_status(payment.id, PaymentStatus::Pending, conn).await?;
            debug!("💳️ Payment {} reused for order #{}", payment.payment_ref, payment.order_id);
            Ok(payment)
        },
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().map(|db| db.is_unique_violation()).unwrap_or(false)
}
