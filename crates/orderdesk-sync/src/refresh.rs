//! Complete refresh: cleanup, import, then a background location backfill,
//! all under one operation lock.

use std::time::Duration;

use orderdesk_core::ImportStatus;
use orderdesk_shopify::OrderFilters;
use tokio::sync::oneshot;

use crate::import::run_import;
use crate::locations::{run_backfill, BackfillPolicy};
use crate::{DebugLog, ImportCounts, OperationGuard, SyncContext, SyncError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub cleaned: bool,
    /// Zero when the import was still running at the timeout.
    pub imported: ImportCounts,
    /// The location backfill is scheduled behind the import. With
    /// `import_in_background` set it only runs if that import later
    /// succeeds; a failed background import leaves status `error` and no
    /// backfill.
    pub sync_started: bool,
    /// Always `false`: the backfill runs after the response.
    pub sync_complete: bool,
    pub import_in_background: bool,
    /// Set when cleanup or the import failed.
    pub error: Option<String>,
}

type ImportResult = (Result<ImportCounts, SyncError>, Vec<String>);

/// Wipes the active tables, re-imports, and kicks off the location
/// backfill.
///
/// The import runs on a spawned task raced against
/// `refresh_import_timeout_secs`. On timeout the status moves from
/// `importing` to `background` and this returns with zero counts while the
/// task keeps going. The task runs the backfill after a successful import
/// and releases the lock when it is done.
///
/// Cleanup and import failures are reported in
/// [`RefreshOutcome::error`] together with the debug log.
///
/// # Errors
///
/// - [`SyncError::Config`] if the token or endpoint is missing.
/// - [`SyncError::Busy`] if another operation holds the lock.
pub async fn complete_refresh(
    ctx: &SyncContext,
    request_token: Option<&str>,
    filters: Option<OrderFilters>,
    log: &mut DebugLog,
) -> Result<RefreshOutcome, SyncError> {
    let credentials = crate::resolve_credentials(&ctx.pool, request_token).await?;
    let guard = OperationGuard::acquire(&ctx.pool, "refresh", ctx.config.lock_ttl_secs)
        .await?
        .resetting_import_status();

    if let Err(e) = crate::cleanup::run_cleanup(&ctx.pool, log).await {
        log.error(format!("cleanup failed; refresh aborted: {e}"));
        guard.release().await;
        return Ok(RefreshOutcome {
            error: Some(e.to_string()),
            ..RefreshOutcome::default()
        });
    }
    log.info("cleanup complete; starting import");

    let (tx, rx) = oneshot::channel::<ImportResult>();
    let task_ctx = ctx.clone();
    let filters = filters.unwrap_or_default();
    tokio::spawn(async move {
        let mut import_log = DebugLog::new("refresh-import");
        let result = run_import(&task_ctx, &credentials, &filters, &mut import_log).await;
        let imported = result.is_ok();
        // The receiver is gone once the caller has timed out.
        let _ = tx.send((result, import_log.into_messages()));

        if imported {
            let mut sync_log = DebugLog::new("refresh-locations");
            match run_backfill(
                &task_ctx,
                &credentials,
                BackfillPolicy::default(),
                &mut sync_log,
            )
            .await
            {
                Ok(summary) => tracing::info!(
                    updated = summary.updated,
                    processed = summary.total_processed,
                    steps = summary.steps,
                    "refresh location sync finished"
                ),
                Err(e) => tracing::error!(error = %e, "refresh location sync failed"),
            }
        }

        guard.release().await;
    });

    let timeout = Duration::from_secs(ctx.config.refresh_import_timeout_secs);
    let outcome = match tokio::time::timeout(timeout, rx).await {
        Ok(Ok((Ok(counts), messages))) => {
            log.extend(messages);
            RefreshOutcome {
                cleaned: true,
                imported: counts,
                sync_started: true,
                ..RefreshOutcome::default()
            }
        }
        Ok(Ok((Err(e), messages))) => {
            log.extend(messages);
            RefreshOutcome {
                cleaned: true,
                error: Some(e.to_string()),
                ..RefreshOutcome::default()
            }
        }
        Ok(Err(_)) => {
            let e = SyncError::Task("import task ended without a result".to_string());
            log.error(e.to_string());
            RefreshOutcome {
                cleaned: true,
                error: Some(e.to_string()),
                ..RefreshOutcome::default()
            }
        }
        Err(_) => {
            log.info(format!(
                "import still running after {}s; continuing in the background",
                timeout.as_secs()
            ));
            mark_background(ctx).await;
            RefreshOutcome {
                cleaned: true,
                sync_started: true,
                import_in_background: true,
                ..RefreshOutcome::default()
            }
        }
    };

    Ok(outcome)
}

/// `importing` becomes `background`; any other status is left alone.
async fn mark_background(ctx: &SyncContext) {
    match orderdesk_db::replace_import_status(
        &ctx.pool,
        ImportStatus::Importing,
        ImportStatus::Background,
    )
    .await
    {
        Ok(true) => {}
        Ok(false) => tracing::debug!("import left importing before the timeout was handled"),
        Err(e) => tracing::warn!(error = %e, "failed to mark import as background"),
    }
}
