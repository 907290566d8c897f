use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A Shopify order normalized for the `shopify_orders` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedOrder {
    pub shopify_order_id: i64,
    /// Display number including the `#` prefix, e.g. `"#1042"`.
    pub shopify_order_number: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Mirrors Shopify `fulfillment_status`: `"unfulfilled"` or `"partial"`.
    pub status: String,
    pub note: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    /// Raw line item payload kept for the dashboard's legacy order view.
    pub raw_line_items: serde_json::Value,
    pub line_items: Vec<NormalizedLineItem>,
}

impl NormalizedOrder {
    /// Number of line items, saturating at `i32::MAX` for the `items_count` column.
    #[must_use]
    pub fn items_count(&self) -> i32 {
        i32::try_from(self.line_items.len()).unwrap_or(i32::MAX)
    }
}

/// One SKU within a [`NormalizedOrder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedLineItem {
    /// Shopify line item id, or a negative synthetic id when Shopify sent none.
    pub shopify_line_item_id: i64,
    pub sku: Option<String>,
    pub title: String,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub properties: serde_json::Value,
}

impl NormalizedLineItem {
    /// `true` when the id was generated locally rather than supplied by Shopify.
    #[must_use]
    pub fn has_synthetic_id(&self) -> bool {
        self.shopify_line_item_id < 0
    }
}
