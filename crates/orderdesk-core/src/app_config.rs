use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub shopify_request_timeout_secs: u64,
    pub shopify_user_agent: String,
    pub shopify_min_request_interval_ms: u64,
    pub shopify_max_rate_limit_retries: u32,
    pub shopify_api_version: String,
    pub import_page_limit: u32,
    pub import_batch_size: usize,
    pub import_batch_delay_ms: u64,
    pub location_batch_size: u32,
    pub refresh_import_timeout_secs: u64,
    pub operation_lock_ttl_secs: u64,
    pub auto_import_cron: String,
}

impl AppConfig {
    /// Pipeline tunables derived from this config.
    #[must_use]
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            page_limit: self.import_page_limit,
            batch_size: self.import_batch_size.max(1),
            batch_delay_ms: self.import_batch_delay_ms,
            location_batch_size: self.location_batch_size,
            refresh_import_timeout_secs: self.refresh_import_timeout_secs,
            lock_ttl_secs: self.operation_lock_ttl_secs,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "shopify_request_timeout_secs",
                &self.shopify_request_timeout_secs,
            )
            .field("shopify_user_agent", &self.shopify_user_agent)
            .field(
                "shopify_min_request_interval_ms",
                &self.shopify_min_request_interval_ms,
            )
            .field(
                "shopify_max_rate_limit_retries",
                &self.shopify_max_rate_limit_retries,
            )
            .field("shopify_api_version", &self.shopify_api_version)
            .field("import_page_limit", &self.import_page_limit)
            .field("import_batch_size", &self.import_batch_size)
            .field("import_batch_delay_ms", &self.import_batch_delay_ms)
            .field("location_batch_size", &self.location_batch_size)
            .field(
                "refresh_import_timeout_secs",
                &self.refresh_import_timeout_secs,
            )
            .field("operation_lock_ttl_secs", &self.operation_lock_ttl_secs)
            .field("auto_import_cron", &self.auto_import_cron)
            .finish()
    }
}

/// Tunables for the sync pipelines.
///
/// Kept separate from [`AppConfig`] so pipelines and their tests do not need
/// a database URL or bind address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// `limit` query parameter for the REST orders endpoint.
    pub page_limit: u32,
    /// Orders written per batch within a page.
    pub batch_size: usize,
    /// Pause between order batches.
    pub batch_delay_ms: u64,
    /// Line items per GraphQL location lookup.
    pub location_batch_size: u32,
    pub refresh_import_timeout_secs: u64,
    pub lock_ttl_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_limit: 50,
            batch_size: 5,
            batch_delay_ms: 500,
            location_batch_size: crate::DEFAULT_LOCATION_BATCH_SIZE,
            refresh_import_timeout_secs: 60,
            lock_ttl_secs: 1800,
        }
    }
}
