//! Conversion from raw Shopify orders to [`orderdesk_core::NormalizedOrder`],
//! plus the eligibility filter and GID helpers shared by the pipelines.

use orderdesk_core::{NormalizedLineItem, NormalizedOrder};
use rand::Rng;

use crate::types::{ShopifyLineItem, ShopifyOrder};

const LINE_ITEM_GID_PREFIX: &str = "gid://shopify/LineItem/";
const LOCATION_GID_PREFIX: &str = "gid://shopify/Location/";

/// Why an order returned by Shopify must not be imported, if it must not.
///
/// The REST filter already asks for open orders; this re-checks the payload
/// because Shopify has been seen returning cancelled orders anyway.
#[must_use]
pub fn ineligibility_reason(order: &ShopifyOrder) -> Option<&'static str> {
    if order.cancelled_at.is_some() {
        return Some("cancelled");
    }
    if order.closed_at.is_some() {
        return Some("closed");
    }
    if order.status.as_deref() == Some("archived") {
        return Some("archived");
    }
    None
}

/// Normalizes a raw [`ShopifyOrder`].
///
/// Line items without a Shopify id get a random negative id so they can
/// still be stored under the `(order_id, shopify_line_item_id)` key.
#[must_use]
pub fn normalize_order(order: ShopifyOrder) -> NormalizedOrder {
    let shopify_order_number = order
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("#{}", order.order_number.unwrap_or(order.id)));

    let customer_name = order.customer.as_ref().and_then(|c| {
        let full = format!(
            "{} {}",
            c.first_name.as_deref().unwrap_or_default(),
            c.last_name.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        (!full.is_empty()).then(|| full.to_owned())
    });
    let email = order
        .email
        .clone()
        .or_else(|| order.customer.as_ref().and_then(|c| c.email.clone()))
        .filter(|s| !s.is_empty());
    let phone = order
        .phone
        .clone()
        .or_else(|| order.customer.as_ref().and_then(|c| c.phone.clone()))
        .filter(|s| !s.is_empty());

    let raw_line_items =
        serde_json::to_value(&order.line_items).unwrap_or_else(|_| serde_json::json!([]));

    let mut rng = rand::rng();
    let line_items = order
        .line_items
        .into_iter()
        .map(|item| normalize_line_item(item, &mut rng))
        .collect();

    NormalizedOrder {
        shopify_order_id: order.id,
        shopify_order_number,
        created_at: order.created_at,
        customer_name,
        email,
        phone,
        status: order
            .fulfillment_status
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unfulfilled".to_string()),
        note: order.note.filter(|s| !s.is_empty()),
        shipping_address: order.shipping_address.filter(|v| !v.is_null()),
        raw_line_items,
        line_items,
    }
}

fn normalize_line_item(item: ShopifyLineItem, rng: &mut impl Rng) -> NormalizedLineItem {
    let shopify_line_item_id = item
        .id
        .unwrap_or_else(|| -rng.random_range(1..=i64::from(i32::MAX)));

    let title = item
        .title
        .or(item.name)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled item".to_string());

    NormalizedLineItem {
        shopify_line_item_id,
        sku: item.sku.filter(|s| !s.is_empty()),
        title,
        quantity: item.quantity,
        price: item.price,
        product_id: item.product_id,
        variant_id: item.variant_id,
        properties: if item.properties.is_null() {
            serde_json::json!([])
        } else {
            item.properties
        },
    }
}

/// Normalizes user input like `1234`, `#1234` or ` #1234 ` to `#1234`.
///
/// Returns `None` when nothing but `#` and whitespace remains.
#[must_use]
pub fn normalize_order_number(raw: &str) -> Option<String> {
    let digits = raw.trim().trim_start_matches('#').trim();
    if digits.is_empty() {
        return None;
    }
    Some(format!("#{digits}"))
}

/// `gid://shopify/LineItem/{id}`.
#[must_use]
pub fn line_item_gid(id: i64) -> String {
    format!("{LINE_ITEM_GID_PREFIX}{id}")
}

/// Parses the numeric id back out of a line item GID.
#[must_use]
pub fn parse_line_item_gid(gid: &str) -> Option<i64> {
    gid.strip_prefix(LINE_ITEM_GID_PREFIX)?.parse().ok()
}

/// Drops the `gid://shopify/Location/` prefix; other strings pass through.
#[must_use]
pub fn strip_location_gid(gid: &str) -> String {
    gid.strip_prefix(LOCATION_GID_PREFIX).unwrap_or(gid).to_owned()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
