//! URL origin extraction for the Shopify client.

/// Extracts the scheme+host origin from a configured endpoint.
///
/// Given `"https://moto.myshopify.com/admin/api/2023-07/orders.json"`,
/// returns `"https://moto.myshopify.com"`. The GraphQL endpoint is built from
/// this origin, so it does not matter which REST path the endpoint setting
/// points at.
#[must_use]
pub fn extract_store_origin(endpoint: &str) -> String {
    reqwest::Url::parse(endpoint).map_or_else(
        |e| {
            tracing::warn!(
                endpoint,
                error = %e,
                "could not parse Shopify endpoint as URL; falling back to string split for origin extraction"
            );
            endpoint
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}
