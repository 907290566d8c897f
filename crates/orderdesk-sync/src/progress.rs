use orderdesk_core::{ImportProgress, ImportStatus};
use sqlx::PgPool;

use crate::SyncError;

/// Stored import progress plus the actual active row counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub progress: ImportProgress,
    pub active_orders: u64,
    pub active_line_items: u64,
}

/// Reads the progress settings and the active row counts.
///
/// Once an import is `complete` the reported counters are reconciled to the
/// row counts. Read-only: the stored per-run counters are never rewritten.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if a read fails.
pub async fn import_progress(pool: &PgPool) -> Result<ProgressReport, SyncError> {
    let mut progress = orderdesk_db::load_import_progress(pool).await?;
    let active_orders = u64::try_from(orderdesk_db::count_orders(pool).await?).unwrap_or(0);
    let active_line_items =
        u64::try_from(orderdesk_db::count_order_items(pool).await?).unwrap_or(0);

    if progress.status == ImportStatus::Complete
        && (progress.orders_imported != active_orders
            || progress.lines_imported != active_line_items)
    {
        tracing::debug!(
            stored_orders = progress.orders_imported,
            stored_lines = progress.lines_imported,
            active_orders,
            active_line_items,
            "reporting row counts in place of stored import counters"
        );
        progress.orders_imported = active_orders;
        progress.lines_imported = active_line_items;
    }

    Ok(ProgressReport {
        progress,
        active_orders,
        active_line_items,
    })
}
