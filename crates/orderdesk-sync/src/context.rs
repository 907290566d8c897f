use std::sync::Arc;

use orderdesk_core::SyncConfig;
use orderdesk_shopify::ShopifyClient;
use sqlx::PgPool;

/// Everything a pipeline needs. Cheap to clone; the pool and client are
/// shared handles.
#[derive(Clone)]
pub struct SyncContext {
    pub pool: PgPool,
    pub client: Arc<ShopifyClient>,
    pub config: SyncConfig,
}

impl SyncContext {
    #[must_use]
    pub fn new(pool: PgPool, client: Arc<ShopifyClient>, config: SyncConfig) -> Self {
        Self {
            pool,
            client,
            config,
        }
    }
}
