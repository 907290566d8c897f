use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by Shopify at {url}: gave up after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("invalid Shopify endpoint \"{endpoint}\": {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("GraphQL error: {message}")]
    GraphQl { message: String },
}

impl ShopifyError {
    /// HTTP status of an upstream rejection, if this error carries one.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ShopifyError::UnexpectedStatus { status, .. } => Some(*status),
            ShopifyError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}
