//! Database operations for `shopify_archived_orders` and
//! `shopify_archived_order_items`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `shopify_archived_orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArchivedOrderRow {
    pub id: Uuid,
    pub shopify_order_id: i64,
    pub shopify_order_number: String,
    pub status: String,
    pub items_count: i32,
    pub archived_at: DateTime<Utc>,
}

/// Lists archived orders, oldest archive first. With `only_unfulfilled`
/// only rows whose status is `unfulfilled` are returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_archived_orders(
    pool: &PgPool,
    only_unfulfilled: bool,
) -> Result<Vec<ArchivedOrderRow>, DbError> {
    let rows = sqlx::query_as::<_, ArchivedOrderRow>(
        "SELECT id, shopify_order_id, shopify_order_number, status, items_count, archived_at \
         FROM shopify_archived_orders \
         WHERE (NOT $1 OR status = 'unfulfilled') \
         ORDER BY archived_at, id",
    )
    .bind(only_unfulfilled)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// `true` if `shopify_order_id` is present in the active table.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn active_order_exists(pool: &PgPool, shopify_order_id: i64) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM shopify_orders WHERE shopify_order_id = $1)",
    )
    .bind(shopify_order_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Moves one archived order and its items back into the active tables.
///
/// Runs in a single transaction: the order is copied, its items are copied
/// under the new order id, and the archived copy is deleted (items cascade).
/// Returns the new active order id, or `None` when an active order with the
/// same `shopify_order_id` already exists or the archived row is gone; in
/// both cases nothing is changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back.
pub async fn restore_archived_order(
    pool: &PgPool,
    archived_id: Uuid,
) -> Result<Option<Uuid>, DbError> {
    let mut tx = pool.begin().await?;

    let new_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO shopify_orders \
             (shopify_order_id, shopify_order_number, created_at, customer_name, email, phone, \
              status, items_count, imported_at, note, shipping_address, line_items, \
              location_id, location_name) \
         SELECT shopify_order_id, shopify_order_number, created_at, customer_name, email, phone, \
                status, items_count, imported_at, note, shipping_address, line_items, \
                location_id, location_name \
         FROM shopify_archived_orders \
         WHERE id = $1 \
         ON CONFLICT (shopify_order_id) DO NOTHING \
         RETURNING id",
    )
    .bind(archived_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(new_id) = new_id else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query(
        "INSERT INTO shopify_order_items \
             (order_id, shopify_line_item_id, sku, title, quantity, price, \
              product_id, variant_id, properties, location_id, location_name) \
         SELECT $2, shopify_line_item_id, sku, title, quantity, price, \
                product_id, variant_id, properties, location_id, location_name \
         FROM shopify_archived_order_items \
         WHERE order_id = $1",
    )
    .bind(archived_id)
    .bind(new_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM shopify_archived_orders WHERE id = $1")
        .bind(archived_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(new_id))
}

/// Counts `shopify_order_id`s present in both the active and archived
/// tables.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_orders_in_both_tables(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) \
         FROM shopify_orders o \
         JOIN shopify_archived_orders a ON a.shopify_order_id = o.shopify_order_id",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
