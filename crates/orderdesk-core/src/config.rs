use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ORDERDESK_ENV", "development"))?;
    let bind_addr = parse_addr("ORDERDESK_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ORDERDESK_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("ORDERDESK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ORDERDESK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ORDERDESK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "ORDERDESK_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        });
    }

    let shopify_request_timeout_secs = parse_u64("SHOPIFY_REQUEST_TIMEOUT_SECS", "30")?;
    let shopify_user_agent = or_default("SHOPIFY_USER_AGENT", "orderdesk/0.1 (order-sync)");
    let shopify_min_request_interval_ms = parse_u64("SHOPIFY_MIN_REQUEST_INTERVAL_MS", "1500")?;
    let shopify_max_rate_limit_retries = parse_u32("SHOPIFY_MAX_RATE_LIMIT_RETRIES", "5")?;
    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2023-07");

    let import_page_limit = parse_u32("IMPORT_PAGE_LIMIT", "50")?;
    if !(1..=250).contains(&import_page_limit) {
        return Err(ConfigError::InvalidEnvVar {
            var: "IMPORT_PAGE_LIMIT".to_string(),
            reason: format!("must be between 1 and 250, got {import_page_limit}"),
        });
    }
    let import_batch_size = parse_usize("IMPORT_BATCH_SIZE", "5")?;
    let import_batch_delay_ms = parse_u64("IMPORT_BATCH_DELAY_MS", "500")?;
    let location_batch_size = parse_u32("LOCATION_BATCH_SIZE", "40")?;
    if !(1..=crate::continuation::MAX_LOCATION_BATCH_SIZE).contains(&location_batch_size) {
        return Err(ConfigError::InvalidEnvVar {
            var: "LOCATION_BATCH_SIZE".to_string(),
            reason: format!(
                "must be between 1 and {}, got {location_batch_size}",
                crate::continuation::MAX_LOCATION_BATCH_SIZE
            ),
        });
    }

    let refresh_import_timeout_secs = parse_u64("REFRESH_IMPORT_TIMEOUT_SECS", "60")?;
    let operation_lock_ttl_secs = parse_u64("OPERATION_LOCK_TTL_SECS", "1800")?;
    let auto_import_cron = or_default("AUTO_IMPORT_CRON", "0 */15 * * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        shopify_request_timeout_secs,
        shopify_user_agent,
        shopify_min_request_interval_ms,
        shopify_max_rate_limit_retries,
        shopify_api_version,
        import_page_limit,
        import_batch_size,
        import_batch_delay_ms,
        location_batch_size,
        refresh_import_timeout_secs,
        operation_lock_ttl_secs,
        auto_import_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ORDERDESK_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
