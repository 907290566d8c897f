//! HTTP client for the Shopify Admin API (REST orders + GraphQL).

mod graphql;
mod orders;
mod origin;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method};

use crate::error::ShopifyError;
use crate::pagination::CallLimit;
use crate::rate_limit::RateLimiter;

pub use graphql::{graphql_url, LocationLookup, ResolvedLocation};
pub use orders::{orders_url, OrderFilters, OrderPages, OrdersPage};
pub use origin::extract_store_origin;

/// Maximum number of pages to follow before returning an error.
/// Prevents infinite loops on cycling `Link` chains.
pub const MAX_PAGES: usize = 500;

/// Retry-After used when Shopify sends a 429 without a usable header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
pub const CALL_LIMIT_HEADER: &str = "X-Shopify-Shop-Api-Call-Limit";

/// Shopify Admin API client.
///
/// Every request goes through the shared [`RateLimiter`]. HTTP 429 is
/// retried transparently after `Retry-After` seconds, up to
/// `max_rate_limit_retries` times; those retries stay inside the pacing slot
/// of the original request. Any other non-2xx status is returned as
/// [`ShopifyError::UnexpectedStatus`] without retrying.
pub struct ShopifyClient {
    client: Client,
    limiter: Arc<RateLimiter>,
    max_rate_limit_retries: u32,
    api_version: String,
}

/// Body and headers of a successful response.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub body: String,
    pub link: Option<String>,
    pub call_limit: Option<CallLimit>,
}

impl ShopifyClient {
    /// Creates a `ShopifyClient` with configured timeout and `User-Agent`.
    ///
    /// `api_version` is the Admin API version used for GraphQL calls
    /// (e.g. `"2023-07"`).
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        api_version: &str,
        limiter: Arc<RateLimiter>,
        max_rate_limit_retries: u32,
    ) -> Result<Self, ShopifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            limiter,
            max_rate_limit_retries,
            api_version: api_version.to_owned(),
        })
    }

    /// Builds a client from the application config and a shared limiter.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_app_config(
        config: &orderdesk_core::AppConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ShopifyError> {
        Self::new(
            config.shopify_request_timeout_secs,
            &config.shopify_user_agent,
            &config.shopify_api_version,
            limiter,
            config.shopify_max_rate_limit_retries,
        )
    }

    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Sends one request under the rate limiter.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`] after `max_rate_limit_retries` 429s in a row.
    /// - [`ShopifyError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`ShopifyError::Http`] on network or TLS failure.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        json_body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, ShopifyError> {
        self.limiter
            .run(|| self.send_with_429_retry(method, url, token, json_body))
            .await
    }

    async fn send_with_429_retry(
        &self,
        method: Method,
        url: &str,
        token: &str,
        json_body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, ShopifyError> {
        let mut rate_limited = 0u32;

        loop {
            let mut request = self
                .client
                .request(method.clone(), url)
                .header(ACCESS_TOKEN_HEADER, token)
                .header(reqwest::header::ACCEPT, "application/json");
            if let Some(body) = json_body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                rate_limited += 1;
                if rate_limited > self.max_rate_limit_retries {
                    return Err(ShopifyError::RateLimited {
                        url: url.to_owned(),
                        attempts: rate_limited,
                    });
                }

                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after)
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

                tracing::warn!(
                    url,
                    retry_after_secs,
                    attempt = rate_limited,
                    "Shopify returned 429; waiting before retry"
                );
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ShopifyError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                    body,
                });
            }

            // Extract headers before consuming the response body.
            let link = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let call_limit = response
                .headers()
                .get(CALL_LIMIT_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(CallLimit::parse);

            let body = response.text().await?;
            return Ok(RawResponse {
                body,
                link,
                call_limit,
            });
        }
    }
}

/// `Retry-After` in whole seconds. Shopify sends fractional values such as
/// `"2.0"`; those are rounded up.
fn parse_retry_after(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }
    let secs = raw.parse::<f64>().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(secs.ceil() as u64)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
