//! Offline unit tests for orderdesk-db pool configuration and row types.
//! These tests do not require a live database connection.

use orderdesk_core::{AppConfig, Environment};
use orderdesk_db::{HealthReport, OperationLease, PendingLocationItem, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        shopify_request_timeout_secs: 30,
        shopify_user_agent: "ua".to_string(),
        shopify_min_request_interval_ms: 1500,
        shopify_max_rate_limit_retries: 5,
        shopify_api_version: "2023-07".to_string(),
        import_page_limit: 50,
        import_batch_size: 5,
        import_batch_delay_ms: 500,
        location_batch_size: 40,
        refresh_import_timeout_secs: 60,
        operation_lock_ttl_secs: 1800,
        auto_import_cron: "0 */15 * * * *".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn pending_location_item_compares_by_value() {
    use uuid::Uuid;

    let id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    let a = PendingLocationItem {
        id,
        order_id,
        shopify_line_item_id: 11,
    };
    let b = a.clone();
    assert_eq!(a, b);
}

#[test]
fn operation_lease_has_expected_fields() {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    let now = Utc::now();
    let lease = OperationLease {
        owner: Uuid::new_v4(),
        operation: "import".to_string(),
        acquired_at: now,
        expires_at: now + Duration::seconds(30),
    };
    assert_eq!(lease.operation, "import");
    assert!(lease.expires_at > lease.acquired_at);
}

#[test]
fn health_report_is_copy() {
    let report = HealthReport {
        duplicate_orders: 2,
    };
    let copy = report;
    assert_eq!(report, copy);
}
