use sqlx::PgPool;

use crate::{DebugLog, OperationGuard, SyncError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub restored: u64,
    /// Already present in the active table.
    pub skipped: u64,
    pub failed: u64,
}

/// Moves archived orders back into the active tables.
///
/// Each order is restored in its own transaction. Orders whose
/// `shopify_order_id` is already active are skipped; per-order failures are
/// logged and skipped.
///
/// # Errors
///
/// - [`SyncError::Busy`] if another operation holds the lock.
/// - [`SyncError::Db`] if the archived orders cannot be listed.
pub async fn restore_archived_orders(
    pool: &PgPool,
    only_unfulfilled: bool,
    lock_ttl_secs: u64,
    log: &mut DebugLog,
) -> Result<RestoreOutcome, SyncError> {
    let guard = OperationGuard::acquire(pool, "restore", lock_ttl_secs).await?;
    let result = run_restore(pool, only_unfulfilled, log).await;
    guard.release().await;
    result
}

async fn run_restore(
    pool: &PgPool,
    only_unfulfilled: bool,
    log: &mut DebugLog,
) -> Result<RestoreOutcome, SyncError> {
    let archived = orderdesk_db::list_archived_orders(pool, only_unfulfilled).await?;
    log.info(format!("{} archived orders to consider", archived.len()));

    let mut outcome = RestoreOutcome::default();
    for order in &archived {
        match orderdesk_db::active_order_exists(pool, order.shopify_order_id).await {
            Ok(true) => {
                outcome.skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                outcome.failed += 1;
                log.warn(format!(
                    "order {}: could not check active table: {e}",
                    order.shopify_order_number
                ));
                continue;
            }
        }

        match orderdesk_db::restore_archived_order(pool, order.id).await {
            Ok(Some(_)) => outcome.restored += 1,
            // Became active between the check and the insert.
            Ok(None) => outcome.skipped += 1,
            Err(e) => {
                outcome.failed += 1;
                log.warn(format!(
                    "order {}: restore failed: {e}",
                    order.shopify_order_number
                ));
            }
        }
    }

    log.info(format!(
        "restored {}, skipped {} already active, {} failed",
        outcome.restored, outcome.skipped, outcome.failed
    ));
    Ok(outcome)
}
