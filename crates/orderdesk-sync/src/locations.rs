//! Location backfill: resolve the fulfilling location of every line item
//! that does not have one yet, a batch at a time.
//!
//! Each step is stateless on the server. The caller carries a
//! [`ContinuationToken`] from one step to the next; a step selects up to
//! `batchSize` unresolved items with `id > lastProcessedId`, looks them up in
//! one GraphQL `nodes` query, and hands back the advanced token. Zero rows
//! after the cursor means the backfill is complete.
//!
//! [`drive_location_backfill`] runs steps to completion with per-step
//! retries and bounded restarts.

use std::time::Duration;

use chrono::Utc;
use orderdesk_core::{ContinuationToken, ShopifyCredentials};

use crate::{DebugLog, OperationGuard, SyncContext, SyncError};

const LOCK_NAME: &str = "sync-locations";
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Outcome of one backfill step.
///
/// `updated` and `total_processed` are running totals since the token's
/// `start_time`, not per-step counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationStep {
    pub updated: u64,
    pub total_processed: u64,
    pub processing_complete: bool,
    /// Token for the next step; `None` once processing is complete.
    pub continuation_token: Option<ContinuationToken>,
    pub rate_limit_remaining: Option<u32>,
    pub time_elapsed_ms: u64,
}

/// Runs one backfill step under the operation lock.
///
/// `continuation` is the serialized token from the previous step, or `None`
/// to start from the beginning with the configured batch size.
///
/// # Errors
///
/// - [`SyncError::InvalidToken`] for a malformed or unsupported token.
/// - [`SyncError::Config`] if the token or endpoint is missing.
/// - [`SyncError::Busy`] if another operation holds the lock.
/// - [`SyncError::Shopify`] / [`SyncError::Db`] if the lookup or the batch
///   query fails. The token is not advanced; replaying it retries the batch.
pub async fn sync_locations_step(
    ctx: &SyncContext,
    request_token: Option<&str>,
    continuation: Option<&str>,
    log: &mut DebugLog,
) -> Result<LocationStep, SyncError> {
    let token = match continuation.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => ContinuationToken::decode(raw)?,
        None => ContinuationToken::start(ctx.config.location_batch_size, Utc::now()),
    };
    let credentials = crate::resolve_credentials(&ctx.pool, request_token).await?;
    let guard = OperationGuard::acquire(&ctx.pool, LOCK_NAME, ctx.config.lock_ttl_secs).await?;

    let result = run_location_step(ctx, &credentials, &token, log).await;

    guard.release().await;
    result
}

/// One step without credential resolution or locking.
pub(crate) async fn run_location_step(
    ctx: &SyncContext,
    credentials: &ShopifyCredentials,
    token: &ContinuationToken,
    log: &mut DebugLog,
) -> Result<LocationStep, SyncError> {
    let rows = orderdesk_db::list_items_missing_location(
        &ctx.pool,
        token.last_processed_id,
        i64::from(token.batch_size),
    )
    .await?;

    let Some(last) = rows.last() else {
        let elapsed = token.elapsed_ms(Utc::now());
        log.info(format!(
            "location sync complete: {} of {} items updated in {elapsed} ms",
            token.updated_count, token.total_processed
        ));
        return Ok(LocationStep {
            updated: token.updated_count,
            total_processed: token.total_processed,
            processing_complete: true,
            continuation_token: None,
            rate_limit_remaining: None,
            time_elapsed_ms: elapsed,
        });
    };

    // Synthetic (negative) ids were never issued by Shopify.
    let lookup_ids: Vec<i64> = rows
        .iter()
        .map(|row| row.shopify_line_item_id)
        .filter(|id| *id > 0)
        .collect();
    let lookup = ctx
        .client
        .fetch_line_item_locations(&credentials.token, &credentials.endpoint, &lookup_ids)
        .await?;

    let mut updated = 0u64;
    let mut touched_orders = Vec::new();
    for row in &rows {
        let Some(location) = lookup.locations.get(&row.shopify_line_item_id) else {
            continue;
        };
        match orderdesk_db::set_item_location(
            &ctx.pool,
            row.id,
            &location.location_id,
            location.location_name.as_deref(),
        )
        .await
        {
            Ok(true) => {
                updated += 1;
                touched_orders.push(row.order_id);
            }
            Ok(false) => {}
            Err(e) => log.warn(format!(
                "failed to store location for line item {}: {e}",
                row.shopify_line_item_id
            )),
        }
    }

    touched_orders.sort_unstable();
    touched_orders.dedup();
    if !touched_orders.is_empty() {
        let orders = orderdesk_db::sync_order_locations(&ctx.pool, &touched_orders).await?;
        tracing::debug!(orders, "order locations synced from line items");
    }

    let processed = u64::try_from(rows.len()).unwrap_or(u64::MAX);
    let next = token.advance(last.id, processed, updated);
    log.info(format!(
        "batch of {processed}: {updated} locations resolved ({} total so far)",
        next.updated_count
    ));

    Ok(LocationStep {
        updated: next.updated_count,
        total_processed: next.total_processed,
        processing_complete: false,
        time_elapsed_ms: next.elapsed_ms(Utc::now()),
        continuation_token: Some(next),
        rate_limit_remaining: lookup.rate_limit_remaining,
    })
}

/// Retry and restart limits for [`drive_location_backfill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillPolicy {
    /// Attempts per step before the step counts as failed.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub backoff_base: Duration,
    /// Times a failed step may restart the scan from the beginning.
    pub max_restarts: u32,
}

impl Default for BackfillPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            max_restarts: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub steps: u64,
    pub updated: u64,
    pub total_processed: u64,
    pub restarts: u32,
}

/// Runs backfill steps until no unresolved item remains after the cursor.
///
/// Holds the operation lock for the whole run.
///
/// # Errors
///
/// - [`SyncError::Config`] if the token or endpoint is missing.
/// - [`SyncError::Busy`] if another operation holds the lock.
/// - The last step error once retries and restarts are exhausted.
pub async fn drive_location_backfill(
    ctx: &SyncContext,
    request_token: Option<&str>,
    policy: BackfillPolicy,
    log: &mut DebugLog,
) -> Result<BackfillSummary, SyncError> {
    let credentials = crate::resolve_credentials(&ctx.pool, request_token).await?;
    let guard = OperationGuard::acquire(&ctx.pool, LOCK_NAME, ctx.config.lock_ttl_secs).await?;

    let result = run_backfill(ctx, &credentials, policy, log).await;

    guard.release().await;
    result
}

/// The backfill driver without credential resolution or locking.
pub(crate) async fn run_backfill(
    ctx: &SyncContext,
    credentials: &ShopifyCredentials,
    policy: BackfillPolicy,
    log: &mut DebugLog,
) -> Result<BackfillSummary, SyncError> {
    let mut summary = BackfillSummary::default();
    let mut token = ContinuationToken::start(ctx.config.location_batch_size, Utc::now());

    loop {
        match step_with_retry(ctx, credentials, &token, policy, log).await {
            Ok(step) => {
                summary.steps += 1;
                match step.continuation_token {
                    Some(next) if !step.processing_complete => token = next,
                    _ => {
                        summary.updated += step.updated;
                        summary.total_processed += step.total_processed;
                        return Ok(summary);
                    }
                }
            }
            Err(err) => {
                if summary.restarts >= policy.max_restarts {
                    log.error(format!(
                        "location sync gave up after {} restarts: {err}",
                        summary.restarts
                    ));
                    return Err(err);
                }
                summary.restarts += 1;
                summary.updated += token.updated_count;
                summary.total_processed += token.total_processed;
                log.warn(format!(
                    "location sync restarting from the beginning (restart {}): {err}",
                    summary.restarts
                ));
                token = ContinuationToken::start(ctx.config.location_batch_size, Utc::now());
            }
        }
    }
}

async fn step_with_retry(
    ctx: &SyncContext,
    credentials: &ShopifyCredentials,
    token: &ContinuationToken,
    policy: BackfillPolicy,
    log: &mut DebugLog,
) -> Result<LocationStep, SyncError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match run_location_step(ctx, credentials, token, log).await {
            Ok(step) => return Ok(step),
            Err(err) if attempt < policy.max_attempts && !err.is_client_error() => {
                let delay = backoff_delay(policy.backoff_base, attempt);
                log.warn(format!(
                    "location step failed (attempt {attempt}/{}), retrying in {} ms: {err}",
                    policy.max_attempts,
                    delay.as_millis()
                ));
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// `base * 2^(attempt - 1)`, capped at one minute.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(10);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}
