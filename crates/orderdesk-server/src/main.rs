mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use orderdesk_shopify::{RateLimiter, ShopifyClient};
use orderdesk_sync::SyncContext;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = orderdesk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = orderdesk_db::PoolConfig::from_app_config(&config);
    let pool = orderdesk_db::connect_pool(&config.database_url, pool_config).await?;
    orderdesk_db::run_migrations(&pool).await?;

    // One limiter for the whole process: every Shopify call shares the pacing.
    let limiter = Arc::new(RateLimiter::new(std::time::Duration::from_millis(
        config.shopify_min_request_interval_ms,
    )));
    let client = Arc::new(ShopifyClient::from_app_config(&config, limiter)?);
    let sync = SyncContext::new(pool, client, config.sync_config());

    let _scheduler = scheduler::build_scheduler(sync.clone(), &config.auto_import_cron).await?;

    let app = build_app(AppState { sync });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "orderdesk-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
