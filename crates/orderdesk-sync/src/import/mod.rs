//! Order import pipeline: page through open orders, re-check eligibility,
//! and upsert orders plus their line items.

mod order;
mod single;

use std::time::Duration;

use chrono::Utc;
use orderdesk_core::{ImportStatus, NormalizedOrder, SettingName, ShopifyCredentials};
use orderdesk_shopify::{ineligibility_reason, normalize_order, orders_url, OrderFilters};

use crate::{DebugLog, OperationGuard, SyncContext, SyncError};

pub(crate) use order::persist_order;
pub use single::{import_single_order, SingleImportOutcome};

/// Running totals for an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub orders: u64,
    pub line_items: u64,
}

/// Imports every open unfulfilled/partially fulfilled order.
///
/// Runs under the operation lock. Progress counters are persisted after
/// every page; on success `last_sync_time` is stamped and the status becomes
/// `complete`. A fatal error sets the status to `error`; rows written before
/// the failure stay.
///
/// # Errors
///
/// - [`SyncError::Config`] if the token or endpoint is missing.
/// - [`SyncError::Busy`] if another operation holds the lock.
/// - [`SyncError::Shopify`] / [`SyncError::Db`] for pipeline-fatal failures.
pub async fn import_all_orders(
    ctx: &SyncContext,
    request_token: Option<&str>,
    log: &mut DebugLog,
) -> Result<ImportCounts, SyncError> {
    let credentials = crate::resolve_credentials(&ctx.pool, request_token).await?;
    let guard = OperationGuard::acquire(&ctx.pool, "import", ctx.config.lock_ttl_secs)
        .await?
        .resetting_import_status();

    let result = run_import(ctx, &credentials, &OrderFilters::default(), log).await;

    guard.release().await;
    result
}

/// The import itself, without credential resolution or locking.
pub(crate) async fn run_import(
    ctx: &SyncContext,
    credentials: &ShopifyCredentials,
    filters: &OrderFilters,
    log: &mut DebugLog,
) -> Result<ImportCounts, SyncError> {
    orderdesk_db::set_import_status(&ctx.pool, ImportStatus::Importing).await?;

    match import_pages(ctx, credentials, filters, log).await {
        Ok(counts) => {
            finish_import(ctx, counts).await?;
            log.info(format!(
                "import complete: {} orders, {} line items",
                counts.orders, counts.line_items
            ));
            Ok(counts)
        }
        Err(err) => {
            log.error(format!("import failed: {err}"));
            if let Err(status_err) =
                orderdesk_db::set_import_status(&ctx.pool, ImportStatus::Error).await
            {
                tracing::error!(error = %status_err, "failed to record import error status");
            }
            Err(err)
        }
    }
}

async fn import_pages(
    ctx: &SyncContext,
    credentials: &ShopifyCredentials,
    filters: &OrderFilters,
    log: &mut DebugLog,
) -> Result<ImportCounts, SyncError> {
    let first_url = orders_url(&credentials.endpoint, filters, ctx.config.page_limit)?;
    let mut pages = ctx.client.order_pages(&credentials.token, first_url);
    let mut counts = ImportCounts::default();

    while let Some(page) = pages.next_page().await? {
        let page_number = pages.pages_fetched();
        let fetched = page.orders.len();

        let eligible: Vec<NormalizedOrder> = page
            .orders
            .into_iter()
            .filter(|order| match ineligibility_reason(order) {
                Some(reason) => {
                    log.info(format!(
                        "skipping order {}: {reason}",
                        order.name.as_deref().unwrap_or("(unnamed)")
                    ));
                    false
                }
                None => true,
            })
            .map(normalize_order)
            .collect();

        log.info(format!(
            "page {page_number}: {fetched} orders fetched, {} eligible",
            eligible.len()
        ));

        for (batch_index, batch) in eligible.chunks(ctx.config.batch_size.max(1)).enumerate() {
            if batch_index > 0 && ctx.config.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(ctx.config.batch_delay_ms)).await;
            }

            for order in batch {
                match persist_order(&ctx.pool, order, log).await {
                    Ok(lines) => {
                        counts.orders += 1;
                        counts.line_items += lines;
                    }
                    Err(e) => log.warn(format!(
                        "failed to save order {}: {e}",
                        order.shopify_order_number
                    )),
                }
            }
        }

        orderdesk_db::write_import_counters(&ctx.pool, counts.orders, counts.line_items).await?;
        tracing::info!(
            page = page_number,
            orders = counts.orders,
            line_items = counts.line_items,
            rate_limit_remaining = page.rate_limit_remaining,
            "import page processed"
        );
    }

    Ok(counts)
}

async fn finish_import(ctx: &SyncContext, counts: ImportCounts) -> Result<(), SyncError> {
    orderdesk_db::write_import_counters(&ctx.pool, counts.orders, counts.line_items).await?;
    orderdesk_db::set_setting(
        &ctx.pool,
        SettingName::LastSyncTime,
        &Utc::now().to_rfc3339(),
    )
    .await?;
    orderdesk_db::set_import_status(&ctx.pool, ImportStatus::Complete).await?;
    Ok(())
}
