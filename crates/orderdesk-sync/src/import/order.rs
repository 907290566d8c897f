use orderdesk_core::NormalizedOrder;
use orderdesk_db::DbError;
use sqlx::PgPool;

use crate::DebugLog;

/// Upserts one order and its line items, then removes line items that are no
/// longer on the order.
///
/// A failing line item is logged and skipped; the rest of the order is still
/// written. Returns the number of line items written.
///
/// # Errors
///
/// Returns [`DbError`] if the order row itself or the leftover cleanup
/// fails.
pub(crate) async fn persist_order(
    pool: &PgPool,
    order: &NormalizedOrder,
    log: &mut DebugLog,
) -> Result<u64, DbError> {
    let upserted = orderdesk_db::upsert_order(pool, order).await?;

    if order.line_items.is_empty() {
        log.info(format!(
            "order {} has no line items; imported without items",
            order.shopify_order_number
        ));
    }

    let mut written = 0u64;
    for item in &order.line_items {
        if item.has_synthetic_id() {
            log.info(format!(
                "order {}: line item \"{}\" has no Shopify id; assigned {}",
                order.shopify_order_number, item.title, item.shopify_line_item_id
            ));
        }
        match orderdesk_db::upsert_order_item(pool, upserted.id, item).await {
            Ok(_) => written += 1,
            Err(e) => log.warn(format!(
                "order {}: failed to save line item {}: {e}",
                order.shopify_order_number, item.shopify_line_item_id
            )),
        }
    }

    let keep: Vec<i64> = order
        .line_items
        .iter()
        .map(|i| i.shopify_line_item_id)
        .collect();
    let removed = orderdesk_db::delete_items_not_in(pool, upserted.id, &keep).await?;
    if removed > 0 {
        tracing::debug!(
            order = %order.shopify_order_number,
            removed,
            "removed line items no longer on the order"
        );
    }

    Ok(written)
}
