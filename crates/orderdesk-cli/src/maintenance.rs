//! `cleanup`, `refresh`, and `restore` command handlers.

use orderdesk_sync::{DebugLog, SyncContext};
use sqlx::PgPool;

use crate::print_messages;

pub(crate) async fn run_cleanup(pool: &PgPool, lock_ttl_secs: u64) -> anyhow::Result<()> {
    let mut log = DebugLog::new("cleanup");
    let result = orderdesk_sync::cleanup_database(pool, lock_ttl_secs, &mut log).await;
    print_messages(log.messages());
    let outcome = result?;
    println!(
        "deleted {} orders and {} line items",
        outcome.orders_deleted, outcome.items_deleted
    );
    Ok(())
}

/// Runs a complete refresh and waits for the background import and
/// location sync to release the lock before exiting.
pub(crate) async fn run_refresh(ctx: &SyncContext, token: Option<&str>) -> anyhow::Result<()> {
    let mut log = DebugLog::new("refresh");
    let result = orderdesk_sync::complete_refresh(ctx, token, None, &mut log).await;
    print_messages(log.messages());
    let outcome = result?;

    if let Some(error) = outcome.error {
        anyhow::bail!("refresh failed: {error}");
    }
    if outcome.import_in_background {
        println!("import still running in the background");
    } else {
        println!(
            "imported {} orders with {} line items",
            outcome.imported.orders, outcome.imported.line_items
        );
    }

    if outcome.sync_started {
        println!("waiting for the background import and location sync to finish");
        wait_for_lock_release(&ctx.pool).await?;
        let missing = orderdesk_db::count_items_missing_location(&ctx.pool).await?;
        println!("location sync finished; {missing} line items still without a location");
    }
    Ok(())
}

async fn wait_for_lock_release(pool: &PgPool) -> anyhow::Result<()> {
    while orderdesk_db::current_operation_lock(pool).await?.is_some() {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    }
    Ok(())
}

pub(crate) async fn run_restore(
    pool: &PgPool,
    only_unfulfilled: bool,
    lock_ttl_secs: u64,
) -> anyhow::Result<()> {
    let mut log = DebugLog::new("restore");
    let result =
        orderdesk_sync::restore_archived_orders(pool, only_unfulfilled, lock_ttl_secs, &mut log)
            .await;
    print_messages(log.messages());
    let outcome = result?;
    println!(
        "restored {} orders ({} already active, {} failed)",
        outcome.restored, outcome.skipped, outcome.failed
    );
    Ok(())
}
