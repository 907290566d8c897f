//! Background job scheduler.
//!
//! Registers the recurring auto-import job. Each tick checks the
//! `auto_import_enabled` setting before doing any work.

use orderdesk_sync::{AutoImportOutcome, DebugLog, SyncContext};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `cron` does not parse, or the scheduler fails to start.
pub async fn build_scheduler(
    ctx: SyncContext,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_auto_import_job(&scheduler, ctx, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_auto_import_job(
    scheduler: &JobScheduler,
    ctx: SyncContext,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let ctx = ctx.clone();
        Box::pin(async move {
            run_auto_import_tick(&ctx).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: auto-import job registered");
    Ok(())
}

async fn run_auto_import_tick(ctx: &SyncContext) {
    let mut log = DebugLog::new("auto-import");
    match orderdesk_sync::run_auto_import(ctx, &mut log).await {
        Ok(AutoImportOutcome::Disabled) => {}
        Ok(AutoImportOutcome::Skipped(reason)) => {
            tracing::info!(reason = reason.as_str(), "scheduler: auto-import skipped");
        }
        Ok(AutoImportOutcome::Imported(counts)) => tracing::info!(
            orders = counts.orders,
            line_items = counts.line_items,
            "scheduler: auto-import complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: auto-import failed"),
    }
}
