//! Single-row advisory lock serializing sync operations across processes.
//!
//! Holding the lock means owning the one row of `sync_operation_lock`. A
//! lease expires at `expires_at`; after that any caller may take it over, so
//! a crashed holder cannot block syncing forever.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A held (or observed) lock.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OperationLease {
    pub owner: Uuid,
    pub operation: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Tries to take the lock for `operation` for `ttl_secs` seconds.
///
/// Returns the lease on success, `None` while another unexpired lease is
/// held.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn try_acquire_operation_lock(
    pool: &PgPool,
    operation: &str,
    ttl_secs: u64,
) -> Result<Option<OperationLease>, DbError> {
    let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);

    let lease = sqlx::query_as::<_, OperationLease>(
        "INSERT INTO sync_operation_lock (id, operation, owner, acquired_at, expires_at) \
         VALUES (1, $1, $2, NOW(), NOW() + make_interval(secs => $3::double precision)) \
         ON CONFLICT (id) DO UPDATE SET \
             operation   = EXCLUDED.operation, \
             owner       = EXCLUDED.owner, \
             acquired_at = EXCLUDED.acquired_at, \
             expires_at  = EXCLUDED.expires_at \
         WHERE sync_operation_lock.expires_at < NOW() \
         RETURNING owner, operation, acquired_at, expires_at",
    )
    .bind(operation)
    .bind(Uuid::new_v4())
    .bind(ttl)
    .fetch_optional(pool)
    .await?;

    Ok(lease)
}

/// Releases the lock if `owner` still holds it.
///
/// Returns `false` when the lease had already expired and been taken over.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn release_operation_lock(pool: &PgPool, owner: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM sync_operation_lock WHERE owner = $1")
        .bind(owner)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns the current unexpired lease, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn current_operation_lock(pool: &PgPool) -> Result<Option<OperationLease>, DbError> {
    let lease = sqlx::query_as::<_, OperationLease>(
        "SELECT owner, operation, acquired_at, expires_at \
         FROM sync_operation_lock \
         WHERE expires_at >= NOW()",
    )
    .fetch_optional(pool)
    .await?;
    Ok(lease)
}
