//! Wipes the active order tables and resets import progress.

use std::time::Duration;

use orderdesk_core::ImportStatus;
use sqlx::PgPool;

use crate::{DebugLog, OperationGuard, SyncError};

const FALLBACK_FETCH_LIMIT: i64 = 10_000;
const FALLBACK_CHUNK_SIZE: usize = 500;
const FALLBACK_CHUNK_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub items_deleted: u64,
    pub orders_deleted: u64,
}

/// Deletes every active line item, then every active order, under the
/// operation lock. Archived tables are untouched.
///
/// # Errors
///
/// - [`SyncError::Busy`] if another operation holds the lock.
/// - [`SyncError::Cleanup`] if line items remain after both deletion paths.
/// - [`SyncError::Db`] if the order deletion or the progress reset fails.
pub async fn cleanup_database(
    pool: &PgPool,
    lock_ttl_secs: u64,
    log: &mut DebugLog,
) -> Result<CleanupOutcome, SyncError> {
    let guard = OperationGuard::acquire(pool, "cleanup", lock_ttl_secs).await?;
    let result = run_cleanup(pool, log).await;
    guard.release().await;
    result
}

/// Cleanup without locking.
pub(crate) async fn run_cleanup(
    pool: &PgPool,
    log: &mut DebugLog,
) -> Result<CleanupOutcome, SyncError> {
    let items_deleted = match orderdesk_db::delete_all_order_items_rpc(pool).await {
        Ok(n) => {
            log.info(format!("deleted {n} line items"));
            u64::try_from(n).unwrap_or(0)
        }
        Err(e) => {
            log.warn(format!(
                "line item delete function failed, deleting in batches: {e}"
            ));
            delete_items_in_batches(pool, log).await?
        }
    };

    let remaining = orderdesk_db::count_order_items(pool).await?;
    if remaining != 0 {
        log.error(format!("{remaining} line items remain after cleanup"));
        return Err(SyncError::Cleanup(format!(
            "{remaining} line items remain; orders were not deleted"
        )));
    }

    let orders_deleted = orderdesk_db::delete_all_orders_rpc(pool)
        .await
        .map_err(|e| SyncError::Cleanup(format!("failed to delete orders: {e}")))?;
    let orders_deleted = u64::try_from(orders_deleted).unwrap_or(0);
    log.info(format!("deleted {orders_deleted} orders"));

    orderdesk_db::write_import_counters(pool, 0, 0).await?;
    orderdesk_db::set_import_status(pool, ImportStatus::Idle).await?;

    Ok(CleanupOutcome {
        items_deleted,
        orders_deleted,
    })
}

async fn delete_items_in_batches(pool: &PgPool, log: &mut DebugLog) -> Result<u64, SyncError> {
    let ids = orderdesk_db::list_order_item_ids(pool, FALLBACK_FETCH_LIMIT).await?;
    let mut deleted = 0u64;

    for (index, chunk) in ids.chunks(FALLBACK_CHUNK_SIZE).enumerate() {
        if index > 0 {
            tokio::time::sleep(FALLBACK_CHUNK_DELAY).await;
        }
        match orderdesk_db::delete_order_items_by_ids(pool, chunk).await {
            Ok(n) => deleted += n,
            Err(e) => log.warn(format!("failed to delete batch {}: {e}", index + 1)),
        }
    }

    log.info(format!("deleted {deleted} line items in batches"));
    Ok(deleted)
}
