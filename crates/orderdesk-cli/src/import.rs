//! `import` and `locations` command handlers.

use clap::Subcommand;
use orderdesk_sync::{BackfillPolicy, DebugLog, SyncContext};

use crate::print_messages;

#[derive(Debug, Subcommand)]
pub enum ImportCommands {
    /// Import every open unfulfilled or partially fulfilled order
    All {
        /// Shopify API token; falls back to the stored `shopify_token`
        #[arg(long)]
        token: Option<String>,
    },
    /// Import one order by number (`1234` or `#1234`)
    Order {
        number: String,
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum LocationsCommands {
    /// Run the location backfill until every resolvable item has a location
    Sync {
        #[arg(long)]
        token: Option<String>,
    },
}

pub(crate) async fn run_import(ctx: &SyncContext, command: ImportCommands) -> anyhow::Result<()> {
    match command {
        ImportCommands::All { token } => {
            let mut log = DebugLog::new("import-all");
            let result = orderdesk_sync::import_all_orders(ctx, token.as_deref(), &mut log).await;
            print_messages(log.messages());
            let counts = result?;
            println!(
                "imported {} orders with {} line items",
                counts.orders, counts.line_items
            );
        }
        ImportCommands::Order { number, token } => {
            let mut log = DebugLog::new("import-order");
            let result =
                orderdesk_sync::import_single_order(ctx, token.as_deref(), &number, &mut log)
                    .await;
            print_messages(log.messages());
            let outcome = result?;
            println!("{}", outcome.message);
        }
    }
    Ok(())
}

pub(crate) async fn run_locations(
    ctx: &SyncContext,
    command: LocationsCommands,
) -> anyhow::Result<()> {
    match command {
        LocationsCommands::Sync { token } => {
            let mut log = DebugLog::new("sync-locations");
            let result = orderdesk_sync::drive_location_backfill(
                ctx,
                token.as_deref(),
                BackfillPolicy::default(),
                &mut log,
            )
            .await;
            print_messages(log.messages());
            let summary = result?;
            println!(
                "location sync complete: {} of {} items updated in {} steps ({} restarts)",
                summary.updated, summary.total_processed, summary.steps, summary.restarts
            );
        }
    }
    Ok(())
}
