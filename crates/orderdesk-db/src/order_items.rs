//! Database operations for `shopify_order_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use orderdesk_core::NormalizedLineItem;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `shopify_order_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub shopify_line_item_id: i64,
    pub sku: Option<String>,
    pub title: String,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub properties: serde_json::Value,
    /// `NULL` until the location backfill resolves it.
    pub location_id: Option<String>,
    pub location_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Minimal projection used by the location backfill.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingLocationItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub shopify_line_item_id: i64,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Upserts a line item under `order_id`.
///
/// Conflicts on `(order_id, shopify_line_item_id)` update the catalogue
/// fields in place. `location_id` / `location_name` are left as they are so a
/// re-import does not discard a resolved location.
///
/// Returns the internal `id` of the row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_order_item(
    pool: &PgPool,
    order_id: Uuid,
    item: &NormalizedLineItem,
) -> Result<Uuid, DbError> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO shopify_order_items \
             (order_id, shopify_line_item_id, sku, title, quantity, price, \
              product_id, variant_id, properties) \
         VALUES ($1, $2, $3, $4, $5, $6::numeric(12,2), $7, $8, $9) \
         ON CONFLICT (order_id, shopify_line_item_id) DO UPDATE SET \
             sku        = EXCLUDED.sku, \
             title      = EXCLUDED.title, \
             quantity   = EXCLUDED.quantity, \
             price      = EXCLUDED.price, \
             product_id = EXCLUDED.product_id, \
             variant_id = EXCLUDED.variant_id, \
             properties = EXCLUDED.properties \
         RETURNING id",
    )
    .bind(order_id)
    .bind(item.shopify_line_item_id)
    .bind(&item.sku)
    .bind(&item.title)
    .bind(item.quantity)
    .bind(item.price)
    .bind(item.product_id)
    .bind(item.variant_id)
    .bind(&item.properties)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Deletes every line item of `order_id` whose Shopify id is not in `keep`.
///
/// With an empty `keep` all of the order's items are removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_items_not_in(
    pool: &PgPool,
    order_id: Uuid,
    keep: &[i64],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM shopify_order_items \
         WHERE order_id = $1 AND NOT (shopify_line_item_id = ANY($2))",
    )
    .bind(order_id)
    .bind(keep)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Stores a resolved location on one line item.
///
/// Returns `true` if the row exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_item_location(
    pool: &PgPool,
    id: Uuid,
    location_id: &str,
    location_name: Option<&str>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE shopify_order_items \
         SET location_id = $2, location_name = $3 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(location_id)
    .bind(location_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns all line items of an order ordered by Shopify line item id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items_for_order(
    pool: &PgPool,
    order_id: Uuid,
) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, shopify_line_item_id, sku, title, quantity, price, \
                product_id, variant_id, properties, location_id, location_name, created_at \
         FROM shopify_order_items \
         WHERE order_id = $1 \
         ORDER BY shopify_line_item_id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns up to `limit` items with no location, ordered by `id`, strictly
/// after `after` when given.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_items_missing_location(
    pool: &PgPool,
    after: Option<Uuid>,
    limit: i64,
) -> Result<Vec<PendingLocationItem>, DbError> {
    let rows = sqlx::query_as::<_, PendingLocationItem>(
        "SELECT id, order_id, shopify_line_item_id \
         FROM shopify_order_items \
         WHERE location_id IS NULL \
           AND ($1::uuid IS NULL OR id > $1) \
         ORDER BY id \
         LIMIT $2",
    )
    .bind(after)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Number of rows in `shopify_order_items`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_order_items(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shopify_order_items")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of line items whose location is still unresolved.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_items_missing_location(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM shopify_order_items WHERE location_id IS NULL",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
