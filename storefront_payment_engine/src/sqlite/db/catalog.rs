//! Minimal product/cart store. Catalog CRUD proper lives outside this service; the engine only needs enough of the
//! catalog to resolve a cart into priced line items, plus seeding helpers for tests and tooling.
use sfg_common::Money;
use sqlx::SqliteConnection;

use crate::db_types::{CartLine, Product};

/// Resolves the cart's contents against the product table. Items whose product has been withdrawn come back with
/// `unit_price = None`; the submission flow turns those into validation failures.
pub async fn fetch_cart_lines(cart_id: &str, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
            SELECT ci.product_id AS product_id, ci.quantity AS quantity, p.unit_price AS unit_price
            FROM cart_items ci LEFT JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Consumes a cart once its order has been placed. Cart items cascade.
pub async fn delete_cart(cart_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart_id).execute(conn).await?;
    Ok(())
}

pub async fn insert_product(title: &str, unit_price: Money, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as("INSERT INTO products (title, unit_price) VALUES ($1, $2) RETURNING *")
        .bind(title)
        .bind(unit_price.value())
        .fetch_one(conn)
        .await?;
    Ok(product)
}

pub async fn delete_product(product_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM products WHERE id = $1").bind(product_id).execute(conn).await?;
    Ok(())
}

pub async fn create_cart(cart_id: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO carts (id) VALUES ($1)").bind(cart_id).execute(conn).await?;
    Ok(())
}

pub async fn set_cart_item(
    cart_id: &str,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = excluded.quantity
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}
