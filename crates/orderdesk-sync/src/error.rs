use orderdesk_core::CoreError;
use orderdesk_db::DbError;
use orderdesk_shopify::ShopifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid continuation token: {0}")]
    InvalidToken(#[from] CoreError),

    #[error("another sync operation is already running: {operation}")]
    Busy { operation: String },

    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("cleanup failed: {0}")]
    Cleanup(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// `true` for errors caused by the request rather than by Shopify or the
    /// database.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, SyncError::Config(_) | SyncError::InvalidToken(_))
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Db(DbError::Sqlx(err))
    }
}
