//! Server-side mutual exclusion for sync operations.

use orderdesk_core::ImportStatus;
use orderdesk_db::OperationLease;
use sqlx::PgPool;

use crate::SyncError;

/// A held `sync_operation_lock` lease.
///
/// Release it with [`OperationGuard::release`]. If the guard is dropped
/// while still held (the owning future was cancelled or its task panicked)
/// the lease is released from a spawned task instead. Only a process exit
/// leaves the lease to expire on its own.
#[derive(Debug)]
#[must_use = "the lock stays held until released or expired"]
pub struct OperationGuard {
    pool: PgPool,
    lease: Option<OperationLease>,
    resets_import_status: bool,
}

impl OperationGuard {
    /// Takes the lock for `operation` for `ttl_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Busy`] naming the current holder when the lock
    /// is taken, or [`SyncError::Db`] if the lock table cannot be queried.
    pub async fn acquire(
        pool: &PgPool,
        operation: &str,
        ttl_secs: u64,
    ) -> Result<Self, SyncError> {
        if let Some(lease) =
            orderdesk_db::try_acquire_operation_lock(pool, operation, ttl_secs).await?
        {
            tracing::debug!(operation, owner = %lease.owner, "operation lock acquired");
            return Ok(Self {
                pool: pool.clone(),
                lease: Some(lease),
                resets_import_status: false,
            });
        }

        let holder = orderdesk_db::current_operation_lock(pool)
            .await?
            .map_or_else(|| "unknown".to_string(), |l| l.operation);
        Err(SyncError::Busy { operation: holder })
    }

    /// An abandoned guard also moves `importing` to `error`, so a cancelled
    /// import does not look like it is still running.
    pub(crate) fn resetting_import_status(mut self) -> Self {
        self.resets_import_status = true;
        self
    }

    /// Releases the lease. Failures are logged, not returned; the lease then
    /// simply expires.
    pub async fn release(mut self) {
        if let Some(lease) = self.lease.take() {
            release_lease(&self.pool, &lease).await;
        }
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        let Some(lease) = self.lease.take() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                operation = %lease.operation,
                "operation abandoned outside a runtime; lock left to expire"
            );
            return;
        };

        tracing::warn!(operation = %lease.operation, "operation abandoned; releasing lock");
        let pool = self.pool.clone();
        let resets_import_status = self.resets_import_status;
        handle.spawn(async move {
            if resets_import_status {
                if let Err(e) = orderdesk_db::replace_import_status(
                    &pool,
                    ImportStatus::Importing,
                    ImportStatus::Error,
                )
                .await
                {
                    tracing::error!(error = %e, "failed to reset abandoned import status");
                }
            }
            release_lease(&pool, &lease).await;
        });
    }
}

async fn release_lease(pool: &PgPool, lease: &OperationLease) {
    match orderdesk_db::release_operation_lock(pool, lease.owner).await {
        Ok(true) => {
            tracing::debug!(operation = %lease.operation, "operation lock released");
        }
        Ok(false) => tracing::warn!(
            operation = %lease.operation,
            "operation lock had already expired and been taken over"
        ),
        Err(e) => tracing::error!(
            operation = %lease.operation,
            error = %e,
            "failed to release operation lock"
        ),
    }
}
