//! GraphQL inventory-location lookup for line items.

use std::collections::HashMap;

use reqwest::Method;
use serde_json::json;

use crate::error::ShopifyError;
use crate::normalize::{line_item_gid, parse_line_item_gid, strip_location_gid};
use crate::types::{GraphQlResponse, NodesData};

use super::origin::extract_store_origin;
use super::ShopifyClient;

const LINE_ITEM_LOCATIONS_QUERY: &str = r"query LineItemLocations($ids: [ID!]!) {
  nodes(ids: $ids) {
    ... on LineItem {
      id
      variant {
        inventoryItem {
          inventoryLevels(first: 5) {
            edges { node { location { id name } } }
          }
        }
      }
    }
  }
}";

/// Location resolved for one line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Numeric id with the `gid://shopify/Location/` prefix removed.
    pub location_id: String,
    pub location_name: Option<String>,
}

/// Result of [`ShopifyClient::fetch_line_item_locations`].
#[derive(Debug, Default)]
pub struct LocationLookup {
    /// Keyed by Shopify line item id. Items without a variant, inventory
    /// item or any inventory level are absent.
    pub locations: HashMap<i64, ResolvedLocation>,
    pub rate_limit_remaining: Option<u32>,
}

/// `{origin}/admin/api/{version}/graphql.json` for the configured endpoint.
#[must_use]
pub fn graphql_url(endpoint: &str, api_version: &str) -> String {
    format!(
        "{}/admin/api/{api_version}/graphql.json",
        extract_store_origin(endpoint)
    )
}

impl ShopifyClient {
    /// Resolves the fulfilling location of each line item in one `nodes`
    /// query. The first inventory level of an item's variant wins.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::GraphQl`] if the response carries `errors`.
    /// - [`ShopifyError::Deserialize`] for an unexpected response shape.
    /// - Request errors from the underlying send.
    pub async fn fetch_line_item_locations(
        &self,
        token: &str,
        endpoint: &str,
        line_item_ids: &[i64],
    ) -> Result<LocationLookup, ShopifyError> {
        if line_item_ids.is_empty() {
            return Ok(LocationLookup::default());
        }

        let url = graphql_url(endpoint, self.api_version());
        let ids: Vec<String> = line_item_ids.iter().map(|id| line_item_gid(*id)).collect();
        let body = json!({
            "query": LINE_ITEM_LOCATIONS_QUERY,
            "variables": { "ids": ids },
        });

        let raw = self.send(Method::POST, &url, token, Some(&body)).await?;
        let parsed =
            serde_json::from_str::<GraphQlResponse<NodesData>>(&raw.body).map_err(|e| {
                ShopifyError::Deserialize {
                    context: format!("line item locations from {url}"),
                    source: e,
                }
            })?;

        if !parsed.errors.is_empty() {
            let message = parsed
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ShopifyError::GraphQl { message });
        }

        let data = parsed.data.ok_or_else(|| ShopifyError::GraphQl {
            message: "response carried neither data nor errors".to_string(),
        })?;

        let locations = data
            .nodes
            .into_iter()
            .flatten()
            .filter_map(|node| {
                let line_item_id = parse_line_item_gid(&node.id)?;
                let level = node
                    .variant?
                    .inventory_item?
                    .inventory_levels
                    .edges
                    .into_iter()
                    .next()?;
                Some((
                    line_item_id,
                    ResolvedLocation {
                        location_id: strip_location_gid(&level.node.location.id),
                        location_name: level.node.location.name,
                    },
                ))
            })
            .collect();

        Ok(LocationLookup {
            locations,
            rate_limit_remaining: raw.call_limit.map(crate::pagination::CallLimit::remaining),
        })
    }
}
