mod import;
mod maintenance;
mod status;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use orderdesk_shopify::{RateLimiter, ShopifyClient};
use orderdesk_sync::SyncContext;
use tracing_subscriber::EnvFilter;

use crate::import::{ImportCommands, LocationsCommands};
use crate::status::SettingsCommands;

#[derive(Debug, Parser)]
#[command(name = "orderdesk-cli")]
#[command(about = "Shopify order sync for the warehouse dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database connectivity and migrations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import orders from Shopify
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Resolve line item fulfilment locations
    Locations {
        #[command(subcommand)]
        command: LocationsCommands,
    },
    /// Delete every active order and line item
    Cleanup,
    /// Cleanup, re-import, then backfill locations
    Refresh {
        /// Shopify API token; falls back to the stored `shopify_token`
        #[arg(long)]
        token: Option<String>,
    },
    /// Move archived orders back into the active tables
    Restore {
        /// Only restore archived orders whose status is `unfulfilled`
        #[arg(long)]
        only_unfulfilled: bool,
    },
    /// Show import progress and row counts
    Status,
    /// Read or write a raw setting
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("orderdesk-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = orderdesk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = orderdesk_db::PoolConfig::from_app_config(&config);
    let pool = orderdesk_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                orderdesk_db::ping(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = orderdesk_db::run_migrations(&pool).await?;
                println!("migrations applied: {applied}");
            }
        },
        Commands::Cleanup => {
            maintenance::run_cleanup(&pool, config.operation_lock_ttl_secs).await?;
        }
        Commands::Restore { only_unfulfilled } => {
            maintenance::run_restore(&pool, only_unfulfilled, config.operation_lock_ttl_secs)
                .await?;
        }
        Commands::Status => status::run_status(&pool).await?,
        Commands::Settings { command } => status::run_settings(&pool, command).await?,
        Commands::Import { command } => {
            let ctx = sync_context(pool, &config)?;
            import::run_import(&ctx, command).await?;
        }
        Commands::Locations { command } => {
            let ctx = sync_context(pool, &config)?;
            import::run_locations(&ctx, command).await?;
        }
        Commands::Refresh { token } => {
            let ctx = sync_context(pool, &config)?;
            maintenance::run_refresh(&ctx, token.as_deref()).await?;
        }
    }

    Ok(())
}

fn sync_context(
    pool: sqlx::PgPool,
    config: &orderdesk_core::AppConfig,
) -> anyhow::Result<SyncContext> {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        config.shopify_min_request_interval_ms,
    )));
    let client = ShopifyClient::from_app_config(config, limiter)
        .map_err(|e| anyhow::anyhow!("failed to build Shopify client: {e}"))?;
    Ok(SyncContext::new(pool, Arc::new(client), config.sync_config()))
}

/// Prints collected debug messages, one per line.
pub(crate) fn print_messages(messages: &[String]) {
    for message in messages {
        println!("  {message}");
    }
}

#[cfg(test)]
mod tests;
