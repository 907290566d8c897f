//! REST `orders.json` requests: page fetches, the page walker, and the
//! single-order lookup by display number.

use reqwest::Method;
use serde::Deserialize;

use crate::error::ShopifyError;
use crate::pagination::extract_next_url;
use crate::types::{ShopifyOrder, ShopifyOrdersResponse};

use super::{ShopifyClient, MAX_PAGES};

/// `status` / `fulfillment_status` query filters for the orders endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilters {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_fulfillment_status")]
    pub fulfillment_status: String,
}

fn default_status() -> String {
    "open".to_string()
}

fn default_fulfillment_status() -> String {
    "unfulfilled,partial".to_string()
}

impl Default for OrderFilters {
    fn default() -> Self {
        Self {
            status: default_status(),
            fulfillment_status: default_fulfillment_status(),
        }
    }
}

/// One page of orders.
#[derive(Debug)]
pub struct OrdersPage {
    pub orders: Vec<ShopifyOrder>,
    /// Full URL from `Link: <...>; rel="next"`, if any.
    pub next_url: Option<String>,
    pub rate_limit_remaining: Option<u32>,
}

/// Builds the first-page orders URL from the configured endpoint.
///
/// Existing query parameters on `endpoint` are dropped in favor of the
/// filters and `limit`.
///
/// # Errors
///
/// Returns [`ShopifyError::InvalidEndpoint`] if `endpoint` is not an
/// absolute URL.
pub fn orders_url(
    endpoint: &str,
    filters: &OrderFilters,
    limit: u32,
) -> Result<String, ShopifyError> {
    let mut url = parse_endpoint(endpoint)?;
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("status", &filters.status)
        .append_pair("fulfillment_status", &filters.fulfillment_status)
        .append_pair("limit", &limit.to_string());
    Ok(url.to_string())
}

/// `{endpoint}?status=any&name=%23{number}` for a normalized `#number`.
fn order_by_name_url(endpoint: &str, name: &str) -> Result<String, ShopifyError> {
    let mut url = parse_endpoint(endpoint)?;
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("status", "any")
        .append_pair("name", name);
    Ok(url.to_string())
}

fn parse_endpoint(endpoint: &str) -> Result<reqwest::Url, ShopifyError> {
    reqwest::Url::parse(endpoint.trim()).map_err(|e| ShopifyError::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        reason: e.to_string(),
    })
}

impl ShopifyClient {
    /// Fetches one page of orders from `url` (a first-page URL from
    /// [`orders_url`] or a `next_url` from a previous page).
    ///
    /// # Errors
    ///
    /// Propagates errors from the request, and returns
    /// [`ShopifyError::Deserialize`] if the body is not an orders payload.
    pub async fn fetch_orders_page(
        &self,
        token: &str,
        url: &str,
    ) -> Result<OrdersPage, ShopifyError> {
        let raw = self.send(Method::GET, url, token, None).await?;
        let parsed = serde_json::from_str::<ShopifyOrdersResponse>(&raw.body).map_err(|e| {
            ShopifyError::Deserialize {
                context: format!("orders page from {url}"),
                source: e,
            }
        })?;

        Ok(OrdersPage {
            orders: parsed.orders,
            next_url: extract_next_url(raw.link.as_deref()),
            rate_limit_remaining: raw.call_limit.map(crate::pagination::CallLimit::remaining),
        })
    }

    /// Starts a page walk at `first_url`.
    #[must_use]
    pub fn order_pages<'a>(&'a self, token: &'a str, first_url: String) -> OrderPages<'a> {
        OrderPages {
            client: self,
            token,
            next_url: Some(first_url),
            pages_fetched: 0,
        }
    }

    /// Looks up a single order by its display number (`"#1234"`) across all
    /// statuses.
    ///
    /// Returns `None` when Shopify returns no order whose `name` matches
    /// exactly; the `name` filter is a prefix match on some API versions.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::fetch_orders_page`].
    pub async fn find_order_by_name(
        &self,
        token: &str,
        endpoint: &str,
        name: &str,
    ) -> Result<Option<ShopifyOrder>, ShopifyError> {
        let url = order_by_name_url(endpoint, name)?;
        let page = self.fetch_orders_page(token, &url).await?;
        Ok(page
            .orders
            .into_iter()
            .find(|o| o.name.as_deref() == Some(name)))
    }
}

/// Walks a `Link` header chain one page at a time.
///
/// The caller drives the walk so it can persist progress between pages.
pub struct OrderPages<'a> {
    client: &'a ShopifyClient,
    token: &'a str,
    next_url: Option<String>,
    pages_fetched: usize,
}

impl OrderPages<'_> {
    /// Fetches the next page, or returns `None` once the chain ends.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::PaginationLimit`] once more than
    /// [`MAX_PAGES`] pages would be fetched, and propagates request errors.
    pub async fn next_page(&mut self) -> Result<Option<OrdersPage>, ShopifyError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        if self.pages_fetched >= MAX_PAGES {
            return Err(ShopifyError::PaginationLimit {
                max_pages: MAX_PAGES,
            });
        }

        let page = self.client.fetch_orders_page(self.token, &url).await?;
        self.pages_fetched += 1;
        self.next_url.clone_from(&page.next_url);
        Ok(Some(page))
    }

    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}
