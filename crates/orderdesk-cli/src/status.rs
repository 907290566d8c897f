//! `status` and `settings` command handlers.

use clap::Subcommand;
use orderdesk_core::{SettingName, PLACEHOLDER_TOKEN};
use sqlx::PgPool;

#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    /// Print a setting value
    Get { name: String },
    /// Write a setting value
    Set { name: String, value: String },
}

pub(crate) async fn run_status(pool: &PgPool) -> anyhow::Result<()> {
    let report = orderdesk_sync::import_progress(pool).await?;
    let progress = &report.progress;

    println!("status:          {}", progress.status);
    println!("orders imported: {}", progress.orders_imported);
    println!("lines imported:  {}", progress.lines_imported);
    println!("active orders:   {}", report.active_orders);
    println!("active lines:    {}", report.active_line_items);
    println!(
        "last sync:       {}",
        progress
            .last_sync_time
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
    );
    println!("auto-import:     {}", progress.auto_import_enabled);

    let missing = orderdesk_db::count_items_missing_location(pool).await?;
    println!("missing location: {missing}");
    if let Some(lock) = orderdesk_db::current_operation_lock(pool).await? {
        println!(
            "running:         {} (lease until {})",
            lock.operation,
            lock.expires_at.to_rfc3339()
        );
    }
    Ok(())
}

pub(crate) async fn run_settings(pool: &PgPool, command: SettingsCommands) -> anyhow::Result<()> {
    match command {
        SettingsCommands::Get { name } => {
            let value = orderdesk_db::get_setting(pool, &name).await?;
            match value {
                Some(v) if is_secret(&name) && v != PLACEHOLDER_TOKEN => {
                    println!("{name} = [set, {} chars]", v.len());
                }
                Some(v) => println!("{name} = {v}"),
                None => println!("{name} is not set"),
            }
        }
        SettingsCommands::Set { name, value } => {
            if SettingName::from_name(&name).is_none() {
                tracing::warn!(name = name.as_str(), "writing a setting the sync does not read");
            }
            orderdesk_db::upsert_setting(pool, &name, &value).await?;
            println!("{name} updated");
        }
    }
    Ok(())
}

fn is_secret(name: &str) -> bool {
    SettingName::from_name(name) == Some(SettingName::ShopifyToken)
}
