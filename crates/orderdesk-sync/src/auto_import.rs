use orderdesk_core::{settings::parse_flag, SettingName};

use crate::{import_all_orders, DebugLog, ImportCounts, SyncContext, SyncError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoImportOutcome {
    /// `auto_import_enabled` is not `"true"`.
    Disabled,
    /// Enabled but not runnable right now (missing credentials, lock held).
    Skipped(String),
    Imported(ImportCounts),
}

/// One scheduler tick: runs the import-all pipeline with the stored token
/// when auto-import is enabled.
///
/// # Errors
///
/// Returns the import's error for Shopify or database failures. Missing
/// credentials and a held lock are reported as [`AutoImportOutcome::Skipped`].
pub async fn run_auto_import(
    ctx: &SyncContext,
    log: &mut DebugLog,
) -> Result<AutoImportOutcome, SyncError> {
    let flag = orderdesk_db::get_setting(&ctx.pool, SettingName::AutoImportEnabled.as_str()).await?;
    if !parse_flag(flag.as_deref()) {
        tracing::debug!("auto-import disabled; tick skipped");
        return Ok(AutoImportOutcome::Disabled);
    }

    match import_all_orders(ctx, None, log).await {
        Ok(counts) => Ok(AutoImportOutcome::Imported(counts)),
        Err(SyncError::Config(reason)) => {
            log.info(format!("auto-import skipped: {reason}"));
            Ok(AutoImportOutcome::Skipped(reason))
        }
        Err(SyncError::Busy { operation }) => {
            let reason = format!("{operation} is running");
            log.info(format!("auto-import skipped: {reason}"));
            Ok(AutoImportOutcome::Skipped(reason))
        }
        Err(e) => Err(e),
    }
}
