//! Access to `shopify_settings` through the `get_shopify_setting` /
//! `upsert_shopify_setting` database functions.
//!
//! The raw functions take any setting name so the RPC surface can pass
//! through names this crate does not know about. The typed helpers take a
//! [`SettingName`].

use sqlx::PgPool;

use orderdesk_core::{ImportProgress, ImportStatus, SettingName};

use crate::DbError;

/// Reads a setting by raw name. `None` when the row is missing or its value
/// is `NULL`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_setting(pool: &PgPool, setting_name: &str) -> Result<Option<String>, DbError> {
    let value = sqlx::query_scalar::<_, Option<String>>("SELECT get_shopify_setting($1)")
        .bind(setting_name)
        .fetch_one(pool)
        .await?;

    Ok(value)
}

/// Inserts or replaces a setting by raw name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_setting(
    pool: &PgPool,
    setting_name: &str,
    setting_value: &str,
) -> Result<(), DbError> {
    sqlx::query("SELECT upsert_shopify_setting($1, $2)")
        .bind(setting_name)
        .bind(setting_value)
        .execute(pool)
        .await?;

    Ok(())
}

/// Typed wrapper over [`upsert_setting`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_setting(pool: &PgPool, name: SettingName, value: &str) -> Result<(), DbError> {
    upsert_setting(pool, name.as_str(), value).await
}

/// Writes `shopify_import_status`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_import_status(pool: &PgPool, status: ImportStatus) -> Result<(), DbError> {
    set_setting(pool, SettingName::ImportStatus, status.as_str()).await
}

/// Moves `shopify_import_status` from `from` to `to` in one statement.
/// Returns `false` when the stored status was not `from`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn replace_import_status(
    pool: &PgPool,
    from: ImportStatus,
    to: ImportStatus,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE shopify_settings \
         SET setting_value = $3, updated_at = NOW() \
         WHERE setting_name = $1 AND setting_value = $2",
    )
    .bind(SettingName::ImportStatus.as_str())
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Writes both progress counters as stringified integers.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either upsert fails.
pub async fn write_import_counters(
    pool: &PgPool,
    orders_imported: u64,
    lines_imported: u64,
) -> Result<(), DbError> {
    set_setting(
        pool,
        SettingName::OrdersImported,
        &orders_imported.to_string(),
    )
    .await?;
    set_setting(
        pool,
        SettingName::LinesImported,
        &lines_imported.to_string(),
    )
    .await
}

/// Reads status, counters, last sync time and the auto-import flag in one
/// query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_import_progress(pool: &PgPool) -> Result<ImportProgress, DbError> {
    let names: Vec<&str> = [
        SettingName::ImportStatus,
        SettingName::OrdersImported,
        SettingName::LinesImported,
        SettingName::LastSyncTime,
        SettingName::AutoImportEnabled,
    ]
    .iter()
    .map(|n| n.as_str())
    .collect();

    let rows = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT setting_name, setting_value \
         FROM shopify_settings \
         WHERE setting_name = ANY($1)",
    )
    .bind(&names)
    .fetch_all(pool)
    .await?;

    let value = |name: SettingName| -> Option<&str> {
        rows.iter()
            .find(|(n, _)| n == name.as_str())
            .and_then(|(_, v)| v.as_deref())
    };

    Ok(ImportProgress::from_raw(
        value(SettingName::ImportStatus),
        value(SettingName::OrdersImported),
        value(SettingName::LinesImported),
        value(SettingName::LastSyncTime),
        value(SettingName::AutoImportEnabled),
    ))
}
