//! Shopify Admin API response types for `orders.json` and the GraphQL
//! inventory-location lookup.
//!
//! ## Observed shape
//!
//! ### `name` vs `order_number`
//! `name` is the display number with the store prefix (`"#1042"`);
//! `order_number` is the bare integer. Older webhook payloads omit `name`,
//! so both are optional and normalization falls back in that order.
//!
//! ### Eligibility markers
//! `cancelled_at` / `closed_at` are `null` on open orders and RFC 3339
//! strings otherwise. `status` is only present on some API versions; when it
//! is, `"archived"` marks an order that must not be imported.
//!
//! ### Line item ids
//! Draft-converted orders have been seen with `null` line item ids. The id
//! is therefore optional and a synthetic one is assigned on normalization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level response from `GET orders.json`.
#[derive(Debug, Deserialize)]
pub struct ShopifyOrdersResponse {
    #[serde(default)]
    pub orders: Vec<ShopifyOrder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOrder {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order_number: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub customer: Option<ShopifyCustomer>,
    /// `null` for orders with nothing fulfilled yet.
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Passed through as an opaque blob.
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(default)]
    pub line_items: Vec<ShopifyLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyCustomer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyLineItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Title plus variant, e.g. `"Brake Pads - Front"`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Decimal string, e.g. `"49.99"`.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub variant_id: Option<i64>,
    #[serde(default)]
    pub properties: serde_json::Value,
}

fn default_quantity() -> i32 {
    1
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodesData {
    /// One entry per requested id; `null` for ids Shopify does not know.
    #[serde(default)]
    pub nodes: Vec<Option<LineItemNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineItemNode {
    pub id: String,
    #[serde(default)]
    pub variant: Option<VariantNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantNode {
    #[serde(default)]
    pub inventory_item: Option<InventoryItemNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InventoryItemNode {
    pub inventory_levels: Connection<InventoryLevelNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InventoryLevelNode {
    pub location: LocationNode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationNode {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
