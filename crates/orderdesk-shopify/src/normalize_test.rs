use super::*;
use serde_json::json;

fn order_from(value: serde_json::Value) -> ShopifyOrder {
    serde_json::from_value(value).expect("fixture should deserialize")
}

fn open_order() -> serde_json::Value {
    json!({
        "id": 5_001_234_567_i64,
        "name": "#1042",
        "order_number": 1042,
        "created_at": "2026-03-01T09:30:00-05:00",
        "email": "rider@example.com",
        "phone": null,
        "customer": {"first_name": "Sam", "last_name": "Okafor"},
        "fulfillment_status": null,
        "cancelled_at": null,
        "closed_at": null,
        "note": "",
        "shipping_address": {"city": "Leeds", "zip": "LS1"},
        "line_items": [
            {
                "id": 111,
                "sku": "BRK-PAD-F",
                "title": "Brake Pads",
                "name": "Brake Pads - Front",
                "quantity": 2,
                "price": "49.99",
                "product_id": 9001,
                "variant_id": 8001,
                "properties": []
            }
        ]
    })
}

#[test]
fn open_order_is_eligible() {
    assert!(ineligibility_reason(&order_from(open_order())).is_none());
}

#[test]
fn cancelled_closed_and_archived_orders_are_ineligible() {
    let mut cancelled = open_order();
    cancelled["cancelled_at"] = json!("2026-03-02T10:00:00Z");
    assert_eq!(ineligibility_reason(&order_from(cancelled)), Some("cancelled"));

    let mut closed = open_order();
    closed["closed_at"] = json!("2026-03-02T10:00:00Z");
    assert_eq!(ineligibility_reason(&order_from(closed)), Some("closed"));

    let mut archived = open_order();
    archived["status"] = json!("archived");
    assert_eq!(ineligibility_reason(&order_from(archived)), Some("archived"));
}

#[test]
fn normalizes_core_fields() {
    let order = normalize_order(order_from(open_order()));

    assert_eq!(order.shopify_order_id, 5_001_234_567);
    assert_eq!(order.shopify_order_number, "#1042");
    assert_eq!(order.customer_name.as_deref(), Some("Sam Okafor"));
    assert_eq!(order.email.as_deref(), Some("rider@example.com"));
    assert_eq!(order.status, "unfulfilled");
    assert!(order.note.is_none(), "empty note should normalize to None");
    assert_eq!(order.created_at.to_rfc3339(), "2026-03-01T14:30:00+00:00");
    assert_eq!(order.items_count(), 1);

    let item = &order.line_items[0];
    assert_eq!(item.shopify_line_item_id, 111);
    assert_eq!(item.sku.as_deref(), Some("BRK-PAD-F"));
    assert_eq!(item.title, "Brake Pads");
    assert_eq!(item.quantity, 2);
    assert_eq!(item.price, Some(rust_decimal::Decimal::new(4999, 2)));
    assert!(!item.has_synthetic_id());
}

#[test]
fn keeps_partial_fulfillment_status() {
    let mut raw = open_order();
    raw["fulfillment_status"] = json!("partial");
    assert_eq!(normalize_order(order_from(raw)).status, "partial");
}

#[test]
fn falls_back_to_order_number_when_name_missing() {
    let mut raw = open_order();
    raw["name"] = serde_json::Value::Null;
    assert_eq!(normalize_order(order_from(raw)).shopify_order_number, "#1042");
}

#[test]
fn missing_line_item_id_gets_synthetic_negative_id() {
    let mut raw = open_order();
    raw["line_items"][0]["id"] = serde_json::Value::Null;

    let order = normalize_order(order_from(raw));
    let item = &order.line_items[0];
    assert!(item.has_synthetic_id());
    assert!(item.shopify_line_item_id < 0);
}

#[test]
fn order_without_line_items_normalizes() {
    let mut raw = open_order();
    raw["line_items"] = json!([]);

    let order = normalize_order(order_from(raw));
    assert!(order.line_items.is_empty());
    assert_eq!(order.raw_line_items, json!([]));
}

#[test]
fn raw_line_items_keep_shopify_fields() {
    let order = normalize_order(order_from(open_order()));
    assert_eq!(order.raw_line_items[0]["name"], json!("Brake Pads - Front"));
}

#[test]
fn order_number_normalization() {
    assert_eq!(normalize_order_number("1234").as_deref(), Some("#1234"));
    assert_eq!(normalize_order_number("#1234").as_deref(), Some("#1234"));
    assert_eq!(normalize_order_number(" #1234 ").as_deref(), Some("#1234"));
    assert!(normalize_order_number(" # ").is_none());
}

#[test]
fn gid_helpers() {
    assert_eq!(line_item_gid(42), "gid://shopify/LineItem/42");
    assert_eq!(parse_line_item_gid("gid://shopify/LineItem/42"), Some(42));
    assert_eq!(parse_line_item_gid("gid://shopify/Order/42"), None);
    assert_eq!(strip_location_gid("gid://shopify/Location/7788"), "7788");
    assert_eq!(strip_location_gid("7788"), "7788");
}
