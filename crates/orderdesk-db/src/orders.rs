//! Database operations for `shopify_orders`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use orderdesk_core::NormalizedOrder;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `shopify_orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub shopify_order_id: i64,
    pub shopify_order_number: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Shopify fulfillment status (`unfulfilled`, `partial`) or a warehouse
    /// workflow state set by the dashboard.
    pub status: String,
    pub items_count: i32,
    pub imported_at: DateTime<Utc>,
    pub note: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    /// Set once every line item resolves to the same location.
    pub location_id: Option<String>,
    pub location_name: Option<String>,
}

/// Outcome of [`upsert_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct UpsertedOrder {
    pub id: Uuid,
    /// `false` when an existing row was updated in place.
    pub inserted: bool,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Inserts an order or updates the existing row with the same
/// `shopify_order_id`.
///
/// On update, `status` is only overwritten while it still holds a Shopify
/// fulfillment status (`unfulfilled` / `partial`); workflow states written by
/// the warehouse are kept. Location fields are never touched here.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_order(pool: &PgPool, order: &NormalizedOrder) -> Result<UpsertedOrder, DbError> {
    let row = sqlx::query_as::<_, UpsertedOrder>(
        "INSERT INTO shopify_orders \
             (shopify_order_id, shopify_order_number, created_at, customer_name, email, phone, \
              status, items_count, imported_at, note, shipping_address, line_items) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), $9, $10, $11) \
         ON CONFLICT (shopify_order_id) DO UPDATE SET \
             shopify_order_number = EXCLUDED.shopify_order_number, \
             customer_name        = EXCLUDED.customer_name, \
             email                = EXCLUDED.email, \
             phone                = EXCLUDED.phone, \
             status               = CASE \
                                        WHEN shopify_orders.status IN ('unfulfilled', 'partial', 'fulfilled') \
                                        THEN EXCLUDED.status \
                                        ELSE shopify_orders.status \
                                    END, \
             items_count          = EXCLUDED.items_count, \
             imported_at          = NOW(), \
             note                 = EXCLUDED.note, \
             shipping_address     = EXCLUDED.shipping_address, \
             line_items           = EXCLUDED.line_items \
         RETURNING id, (xmax = 0) AS inserted",
    )
    .bind(order.shopify_order_id)
    .bind(&order.shopify_order_number)
    .bind(order.created_at)
    .bind(&order.customer_name)
    .bind(&order.email)
    .bind(&order.phone)
    .bind(&order.status)
    .bind(order.items_count())
    .bind(&order.note)
    .bind(&order.shipping_address)
    .bind(&order.raw_line_items)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches an active order by its Shopify id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_by_shopify_id(
    pool: &PgPool,
    shopify_order_id: i64,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "SELECT id, shopify_order_id, shopify_order_number, created_at, customer_name, \
                email, phone, status, items_count, imported_at, note, shipping_address, \
                location_id, location_name \
         FROM shopify_orders \
         WHERE shopify_order_id = $1",
    )
    .bind(shopify_order_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Number of rows in `shopify_orders`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_orders(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shopify_orders")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Copies the location onto each given order whose line items all resolve to
/// one and the same location. Orders with unresolved or mixed items are left
/// alone.
///
/// Returns the number of orders updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn sync_order_locations(pool: &PgPool, order_ids: &[Uuid]) -> Result<u64, DbError> {
    if order_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE shopify_orders o \
         SET location_id = s.location_id, location_name = s.location_name \
         FROM ( \
             SELECT order_id, \
                    MIN(location_id)   AS location_id, \
                    MIN(location_name) AS location_name \
             FROM shopify_order_items \
             WHERE order_id = ANY($1) \
             GROUP BY order_id \
             HAVING COUNT(*) = COUNT(location_id) \
                AND COUNT(DISTINCT location_id) = 1 \
         ) s \
         WHERE o.id = s.order_id \
           AND o.location_id IS DISTINCT FROM s.location_id",
    )
    .bind(order_ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
