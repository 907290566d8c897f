//! Live integration tests for orderdesk-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/orderdesk-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use chrono::{TimeZone, Utc};
use orderdesk_core::{ImportStatus, NormalizedLineItem, NormalizedOrder, SettingName};
use orderdesk_db::{
    active_order_exists, count_items_missing_location, count_order_items, count_orders,
    count_orders_in_both_tables, current_operation_lock, delete_all_order_items_rpc,
    delete_all_orders_rpc, delete_items_not_in, delete_order_items_by_ids,
    get_order_by_shopify_id, get_setting, health_check, list_archived_orders,
    list_items_for_order, list_items_missing_location, list_order_item_ids,
    load_import_progress, release_operation_lock, replace_import_status, restore_archived_order,
    set_import_status,
    set_item_location, set_setting, sync_order_locations, try_acquire_operation_lock,
    upsert_order, upsert_order_item, upsert_setting, write_import_counters,
};
use rust_decimal::Decimal;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_line_item(id: i64, sku: &str) -> NormalizedLineItem {
    NormalizedLineItem {
        shopify_line_item_id: id,
        sku: Some(sku.to_string()),
        title: format!("Part {sku}"),
        quantity: 1,
        price: Some(Decimal::new(4999, 2)),
        product_id: Some(9000 + id),
        variant_id: Some(8000 + id),
        properties: serde_json::json!([]),
    }
}

fn make_order(shopify_order_id: i64, items: Vec<NormalizedLineItem>) -> NormalizedOrder {
    NormalizedOrder {
        shopify_order_id,
        shopify_order_number: format!("#{shopify_order_id}"),
        created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        customer_name: Some("Jo Rider".to_string()),
        email: Some("jo@example.com".to_string()),
        phone: None,
        status: "unfulfilled".to_string(),
        note: None,
        shipping_address: Some(serde_json::json!({"city": "Leeds"})),
        raw_line_items: serde_json::json!([]),
        line_items: items,
    }
}

/// Upserts an order and its items the way the import pipeline does.
async fn import_order(pool: &sqlx::PgPool, order: &NormalizedOrder) -> Uuid {
    let upserted = upsert_order(pool, order).await.expect("upsert_order failed");
    for item in &order.line_items {
        upsert_order_item(pool, upserted.id, item)
            .await
            .expect("upsert_order_item failed");
    }
    let keep: Vec<i64> = order
        .line_items
        .iter()
        .map(|i| i.shopify_line_item_id)
        .collect();
    delete_items_not_in(pool, upserted.id, &keep)
        .await
        .expect("delete_items_not_in failed");
    upserted.id
}

/// Inserts an archived order with one item and returns its archived id.
async fn insert_archived_order(pool: &sqlx::PgPool, shopify_order_id: i64, status: &str) -> Uuid {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO shopify_archived_orders \
             (shopify_order_id, shopify_order_number, created_at, status, items_count) \
         VALUES ($1, $2, NOW(), $3, 1) RETURNING id",
    )
    .bind(shopify_order_id)
    .bind(format!("#{shopify_order_id}"))
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_archived_order failed for {shopify_order_id}: {e}"));

    sqlx::query(
        "INSERT INTO shopify_archived_order_items \
             (order_id, shopify_line_item_id, sku, title, quantity, location_id) \
         VALUES ($1, $2, 'SKU-A', 'Archived part', 2, '77')",
    )
    .bind(id)
    .bind(shopify_order_id * 10)
    .execute(pool)
    .await
    .expect("insert archived item failed");

    id
}

// ---------------------------------------------------------------------------
// Section 1: Order upsert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_order_is_idempotent(pool: sqlx::PgPool) {
    let order = make_order(1001, vec![make_line_item(1, "A"), make_line_item(2, "B")]);

    let first = upsert_order(&pool, &order).await.expect("first upsert");
    let second = upsert_order(&pool, &order).await.expect("second upsert");

    assert!(first.inserted);
    assert!(!second.inserted);
    assert_eq!(first.id, second.id);
    assert_eq!(count_orders(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reimport_replaces_line_items_without_leftovers(pool: sqlx::PgPool) {
    let first = make_order(1002, vec![make_line_item(1, "A"), make_line_item(2, "B")]);
    let order_id = import_order(&pool, &first).await;

    let second = make_order(1002, vec![make_line_item(2, "B"), make_line_item(3, "C")]);
    let again = import_order(&pool, &second).await;
    assert_eq!(order_id, again);

    let items = list_items_for_order(&pool, order_id).await.unwrap();
    let ids: Vec<i64> = items.iter().map(|i| i.shopify_line_item_id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(count_order_items(&pool).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reimport_keeps_resolved_item_location(pool: sqlx::PgPool) {
    let order = make_order(1003, vec![make_line_item(1, "A")]);
    let order_id = import_order(&pool, &order).await;
    let item = &list_items_for_order(&pool, order_id).await.unwrap()[0];

    assert!(set_item_location(&pool, item.id, "555", Some("Main Warehouse"))
        .await
        .unwrap());

    import_order(&pool, &order).await;
    let item = &list_items_for_order(&pool, order_id).await.unwrap()[0];
    assert_eq!(item.location_id.as_deref(), Some("555"));
    assert_eq!(item.location_name.as_deref(), Some("Main Warehouse"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn reimport_keeps_warehouse_workflow_status(pool: sqlx::PgPool) {
    let order = make_order(1004, vec![make_line_item(1, "A")]);
    import_order(&pool, &order).await;

    sqlx::query("UPDATE shopify_orders SET status = 'picking' WHERE shopify_order_id = 1004")
        .execute(&pool)
        .await
        .unwrap();

    let mut partial = order.clone();
    partial.status = "partial".to_string();
    import_order(&pool, &partial).await;

    let row = get_order_by_shopify_id(&pool, 1004).await.unwrap().unwrap();
    assert_eq!(row.status, "picking");
}

#[sqlx::test(migrations = "../../migrations")]
async fn reimport_updates_shopify_fulfillment_status(pool: sqlx::PgPool) {
    let order = make_order(1005, vec![make_line_item(1, "A")]);
    import_order(&pool, &order).await;

    let mut partial = order.clone();
    partial.status = "partial".to_string();
    import_order(&pool, &partial).await;

    let row = get_order_by_shopify_id(&pool, 1005).await.unwrap().unwrap();
    assert_eq!(row.status, "partial");
    assert_eq!(row.items_count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn reimport_reopens_order_restored_as_fulfilled(pool: sqlx::PgPool) {
    let order = make_order(1006, vec![make_line_item(1, "A")]);
    import_order(&pool, &order).await;

    sqlx::query("UPDATE shopify_orders SET status = 'fulfilled' WHERE shopify_order_id = 1006")
        .execute(&pool)
        .await
        .unwrap();

    let mut partial = order.clone();
    partial.status = "partial".to_string();
    import_order(&pool, &partial).await;

    let row = get_order_by_shopify_id(&pool, 1006).await.unwrap().unwrap();
    assert_eq!(row.status, "partial");
}

#[sqlx::test(migrations = "../../migrations")]
async fn order_with_no_line_items_is_stored(pool: sqlx::PgPool) {
    let order = make_order(1006, vec![]);
    import_order(&pool, &order).await;

    let row = get_order_by_shopify_id(&pool, 1006).await.unwrap().unwrap();
    assert_eq!(row.items_count, 0);
    assert_eq!(count_order_items(&pool).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Section 2: Location backfill queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn missing_location_scan_resumes_after_cursor(pool: sqlx::PgPool) {
    let items: Vec<NormalizedLineItem> = (1..=5).map(|i| make_line_item(i, "X")).collect();
    import_order(&pool, &make_order(2001, items)).await;

    let first = list_items_missing_location(&pool, None, 2).await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(first[0].id < first[1].id);

    let rest = list_items_missing_location(&pool, Some(first[1].id), 40)
        .await
        .unwrap();
    assert_eq!(rest.len(), 3);
    assert!(rest.iter().all(|r| r.id > first[1].id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_location_scan_skips_resolved_items(pool: sqlx::PgPool) {
    let order_id = import_order(
        &pool,
        &make_order(2002, vec![make_line_item(1, "A"), make_line_item(2, "B")]),
    )
    .await;
    let items = list_items_for_order(&pool, order_id).await.unwrap();
    set_item_location(&pool, items[0].id, "1", None).await.unwrap();

    let pending = list_items_missing_location(&pool, None, 40).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, items[1].id);
    assert_eq!(count_items_missing_location(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn order_location_set_only_when_all_items_agree(pool: sqlx::PgPool) {
    let same = import_order(
        &pool,
        &make_order(2003, vec![make_line_item(1, "A"), make_line_item(2, "B")]),
    )
    .await;
    let mixed = import_order(
        &pool,
        &make_order(2004, vec![make_line_item(3, "C"), make_line_item(4, "D")]),
    )
    .await;
    let partial = import_order(
        &pool,
        &make_order(2005, vec![make_line_item(5, "E"), make_line_item(6, "F")]),
    )
    .await;

    for item in list_items_for_order(&pool, same).await.unwrap() {
        set_item_location(&pool, item.id, "10", Some("Bay 10")).await.unwrap();
    }
    let mixed_items = list_items_for_order(&pool, mixed).await.unwrap();
    set_item_location(&pool, mixed_items[0].id, "10", Some("Bay 10")).await.unwrap();
    set_item_location(&pool, mixed_items[1].id, "20", Some("Bay 20")).await.unwrap();
    let partial_items = list_items_for_order(&pool, partial).await.unwrap();
    set_item_location(&pool, partial_items[0].id, "10", Some("Bay 10")).await.unwrap();

    let updated = sync_order_locations(&pool, &[same, mixed, partial])
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let row = get_order_by_shopify_id(&pool, 2003).await.unwrap().unwrap();
    assert_eq!(row.location_id.as_deref(), Some("10"));
    assert_eq!(row.location_name.as_deref(), Some("Bay 10"));
    let row = get_order_by_shopify_id(&pool, 2004).await.unwrap().unwrap();
    assert!(row.location_id.is_none());
    let row = get_order_by_shopify_id(&pool, 2005).await.unwrap().unwrap();
    assert!(row.location_id.is_none());
}

// ---------------------------------------------------------------------------
// Section 3: Cleanup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cleanup_rpcs_empty_both_tables(pool: sqlx::PgPool) {
    import_order(&pool, &make_order(3001, vec![make_line_item(1, "A")])).await;
    import_order(
        &pool,
        &make_order(3002, vec![make_line_item(2, "B"), make_line_item(3, "C")]),
    )
    .await;

    assert_eq!(delete_all_order_items_rpc(&pool).await.unwrap(), 3);
    assert_eq!(delete_all_orders_rpc(&pool).await.unwrap(), 2);
    assert_eq!(count_order_items(&pool).await.unwrap(), 0);
    assert_eq!(count_orders(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn item_id_batches_delete_when_rpc_is_missing(pool: sqlx::PgPool) {
    import_order(
        &pool,
        &make_order(3003, vec![make_line_item(1, "A"), make_line_item(2, "B")]),
    )
    .await;
    sqlx::query("DROP FUNCTION delete_all_shopify_order_items()")
        .execute(&pool)
        .await
        .unwrap();

    assert!(delete_all_order_items_rpc(&pool).await.is_err());

    let ids = list_order_item_ids(&pool, 10_000).await.unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(delete_order_items_by_ids(&pool, &ids).await.unwrap(), 2);
    assert_eq!(delete_order_items_by_ids(&pool, &[]).await.unwrap(), 0);
    assert_eq!(count_order_items(&pool).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Section 4: Archive / restore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn restore_moves_order_and_items(pool: sqlx::PgPool) {
    let archived_id = insert_archived_order(&pool, 4001, "unfulfilled").await;

    let restored = restore_archived_order(&pool, archived_id)
        .await
        .unwrap()
        .expect("order should be restored");

    assert!(active_order_exists(&pool, 4001).await.unwrap());
    let items = list_items_for_order(&pool, restored).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].location_id.as_deref(), Some("77"));
    assert!(list_archived_orders(&pool, false).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn restore_skips_orders_already_active(pool: sqlx::PgPool) {
    import_order(&pool, &make_order(4002, vec![make_line_item(1, "A")])).await;
    let archived_id = insert_archived_order(&pool, 4002, "unfulfilled").await;

    assert_eq!(count_orders_in_both_tables(&pool).await.unwrap(), 1);
    let restored = restore_archived_order(&pool, archived_id).await.unwrap();
    assert!(restored.is_none());

    assert_eq!(count_orders(&pool).await.unwrap(), 1);
    assert_eq!(list_archived_orders(&pool, false).await.unwrap().len(), 1);
    let report = health_check(&pool).await.unwrap();
    assert_eq!(report.duplicate_orders, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn archived_listing_filters_unfulfilled(pool: sqlx::PgPool) {
    insert_archived_order(&pool, 4003, "unfulfilled").await;
    insert_archived_order(&pool, 4004, "fulfilled").await;

    assert_eq!(list_archived_orders(&pool, false).await.unwrap().len(), 2);
    let only = list_archived_orders(&pool, true).await.unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].shopify_order_id, 4003);
}

// ---------------------------------------------------------------------------
// Section 5: Operation lock
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn lock_is_exclusive_until_released(pool: sqlx::PgPool) {
    let lease = try_acquire_operation_lock(&pool, "import", 600)
        .await
        .unwrap()
        .expect("first acquire should succeed");
    assert_eq!(lease.operation, "import");

    let second = try_acquire_operation_lock(&pool, "cleanup", 600).await.unwrap();
    assert!(second.is_none());

    let held = current_operation_lock(&pool).await.unwrap().unwrap();
    assert_eq!(held.owner, lease.owner);

    assert!(release_operation_lock(&pool, lease.owner).await.unwrap());
    assert!(current_operation_lock(&pool).await.unwrap().is_none());
    assert!(try_acquire_operation_lock(&pool, "cleanup", 600)
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn expired_lock_can_be_taken_over(pool: sqlx::PgPool) {
    let stale = try_acquire_operation_lock(&pool, "import", 600)
        .await
        .unwrap()
        .unwrap();
    sqlx::query("UPDATE sync_operation_lock SET expires_at = NOW() - INTERVAL '1 second'")
        .execute(&pool)
        .await
        .unwrap();

    let fresh = try_acquire_operation_lock(&pool, "refresh", 600)
        .await
        .unwrap()
        .expect("expired lease should be taken over");
    assert_ne!(fresh.owner, stale.owner);

    // The stale owner no longer holds anything.
    assert!(!release_operation_lock(&pool, stale.owner).await.unwrap());
    assert!(current_operation_lock(&pool).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Section 6: Settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn settings_round_trip_through_rpc_functions(pool: sqlx::PgPool) {
    assert_eq!(
        get_setting(&pool, "shopify_token").await.unwrap().as_deref(),
        Some("placeholder_token")
    );
    assert!(get_setting(&pool, "shopify_api_endpoint").await.unwrap().is_none());

    upsert_setting(&pool, "shopify_api_endpoint", "https://shop.example/admin/api/2023-07/orders.json")
        .await
        .unwrap();
    upsert_setting(&pool, "custom_dashboard_flag", "on").await.unwrap();

    assert_eq!(
        get_setting(&pool, "shopify_api_endpoint").await.unwrap().as_deref(),
        Some("https://shop.example/admin/api/2023-07/orders.json")
    );
    assert_eq!(
        get_setting(&pool, "custom_dashboard_flag").await.unwrap().as_deref(),
        Some("on")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_progress_reads_typed_values(pool: sqlx::PgPool) {
    let seeded = load_import_progress(&pool).await.unwrap();
    assert_eq!(seeded.status, ImportStatus::Idle);
    assert_eq!(seeded.orders_imported, 0);
    assert!(!seeded.auto_import_enabled);
    assert!(seeded.last_sync_time.is_none());

    set_import_status(&pool, ImportStatus::Complete).await.unwrap();
    write_import_counters(&pool, 12, 30).await.unwrap();
    set_setting(&pool, SettingName::LastSyncTime, "2026-03-01T10:00:00Z")
        .await
        .unwrap();
    set_setting(&pool, SettingName::AutoImportEnabled, "true")
        .await
        .unwrap();

    let progress = load_import_progress(&pool).await.unwrap();
    assert_eq!(progress.status, ImportStatus::Complete);
    assert_eq!(progress.orders_imported, 12);
    assert_eq!(progress.lines_imported, 30);
    assert_eq!(
        progress.last_sync_time,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap())
    );
    assert!(progress.auto_import_enabled);
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_status_replaced_only_from_expected_value(pool: sqlx::PgPool) {
    set_import_status(&pool, ImportStatus::Complete).await.unwrap();
    let moved = replace_import_status(&pool, ImportStatus::Importing, ImportStatus::Background)
        .await
        .unwrap();
    assert!(!moved);
    assert_eq!(
        load_import_progress(&pool).await.unwrap().status,
        ImportStatus::Complete
    );

    set_import_status(&pool, ImportStatus::Importing).await.unwrap();
    let moved = replace_import_status(&pool, ImportStatus::Importing, ImportStatus::Background)
        .await
        .unwrap();
    assert!(moved);
    assert_eq!(
        load_import_progress(&pool).await.unwrap().status,
        ImportStatus::Background
    );
}
