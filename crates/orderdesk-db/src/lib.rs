//! Postgres access for orderdesk: pool setup, migrations, and the query
//! functions behind every sync pipeline.

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

// Relative to crates/orderdesk-db/Cargo.toml.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Pool sizing taken from [`orderdesk_core::AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &orderdesk_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Opens the pool. Fails fast when the first connection cannot be made
/// within `acquire_timeout_secs`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table may not exist yet on a fresh database; treat
    // absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Result of [`health_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    /// Orders whose `shopify_order_id` is present in both the active and the
    /// archived table. Nonzero is an anomaly, not a failure.
    pub duplicate_orders: i64,
}

/// Ping the pool and look for orders that are both active and archived.
///
/// # Errors
///
/// Returns [`DbError`] if the ping or the duplicate count fails.
pub async fn health_check(pool: &PgPool) -> Result<HealthReport, DbError> {
    ping(pool).await?;
    let duplicate_orders = archive::count_orders_in_both_tables(pool).await?;
    Ok(HealthReport { duplicate_orders })
}

pub mod archive;
pub mod cleanup;
pub mod operation_lock;
pub mod order_items;
pub mod orders;
pub mod settings;

pub use archive::{
    active_order_exists, count_orders_in_both_tables, list_archived_orders,
    restore_archived_order, ArchivedOrderRow,
};
pub use cleanup::{
    delete_all_order_items_rpc, delete_all_orders_rpc, delete_order_items_by_ids,
    list_order_item_ids,
};
pub use operation_lock::{
    current_operation_lock, release_operation_lock, try_acquire_operation_lock, OperationLease,
};
pub use order_items::{
    count_items_missing_location, count_order_items, delete_items_not_in,
    list_items_for_order, list_items_missing_location, set_item_location, upsert_order_item,
    OrderItemRow, PendingLocationItem,
};
pub use orders::{
    count_orders, get_order_by_shopify_id, sync_order_locations, upsert_order, OrderRow,
    UpsertedOrder,
};
pub use settings::{
    get_setting, load_import_progress, replace_import_status, set_import_status, set_setting,
    upsert_setting, write_import_counters,
};
