pub mod app_config;
pub mod config;
pub mod continuation;
pub mod orders;
pub mod settings;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, SyncConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use continuation::{
    ContinuationToken, CONTINUATION_TOKEN_VERSION, DEFAULT_LOCATION_BATCH_SIZE,
    MAX_LOCATION_BATCH_SIZE,
};
pub use orders::{NormalizedLineItem, NormalizedOrder};
pub use settings::{
    resolve_token, ImportProgress, ImportStatus, SettingName, ShopifyCredentials,
    PLACEHOLDER_TOKEN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown import status: {0}")]
    UnknownImportStatus(String),

    #[error("malformed continuation token: {0}")]
    MalformedToken(#[source] serde_json::Error),

    #[error("unsupported continuation token version {found} (expected {expected})")]
    UnsupportedTokenVersion { found: u32, expected: u32 },

    #[error("continuation token batch size must be between 1 and {max}, got {found}")]
    InvalidBatchSize { found: u32, max: u32 },
}
