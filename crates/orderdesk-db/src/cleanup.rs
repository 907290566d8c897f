//! Bulk deletes behind the "delete everything and re-import" reset.

use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Deletes every order item through `delete_all_shopify_order_items()`.
///
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the function is missing or fails.
pub async fn delete_all_order_items_rpc(pool: &PgPool) -> Result<i64, DbError> {
    let deleted = sqlx::query_scalar::<_, i64>("SELECT delete_all_shopify_order_items()")
        .fetch_one(pool)
        .await?;
    Ok(deleted)
}

/// Deletes every active order through `delete_all_shopify_orders()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the function is missing or fails.
pub async fn delete_all_orders_rpc(pool: &PgPool) -> Result<i64, DbError> {
    let deleted = sqlx::query_scalar::<_, i64>("SELECT delete_all_shopify_orders()")
        .fetch_one(pool)
        .await?;
    Ok(deleted)
}

/// Returns up to `limit` order item ids.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_item_ids(pool: &PgPool, limit: i64) -> Result<Vec<Uuid>, DbError> {
    let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM shopify_order_items LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Deletes the given order items.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_order_items_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<u64, DbError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query("DELETE FROM shopify_order_items WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
