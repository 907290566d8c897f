//! Shopify order sync pipelines: import, location backfill, cleanup,
//! restore, complete refresh, and the progress protocol.
//!
//! Every pipeline takes a [`DebugLog`] that collects human-readable notes
//! for the caller, on success and on failure alike.

pub mod auto_import;
pub mod cleanup;
pub mod context;
pub mod credentials;
pub mod debug_log;
pub mod error;
pub mod import;
pub mod lock;
pub mod locations;
pub mod progress;
pub mod refresh;
pub mod restore;

pub use auto_import::{run_auto_import, AutoImportOutcome};
pub use cleanup::{cleanup_database, CleanupOutcome};
pub use context::SyncContext;
pub use credentials::resolve_credentials;
pub use debug_log::DebugLog;
pub use error::SyncError;
pub use import::{import_all_orders, import_single_order, ImportCounts, SingleImportOutcome};
pub use locations::{
    drive_location_backfill, sync_locations_step, BackfillPolicy, BackfillSummary, LocationStep,
};
pub use lock::OperationGuard;
pub use progress::{import_progress, ProgressReport};
pub use refresh::{complete_refresh, RefreshOutcome};
pub use restore::{restore_archived_orders, RestoreOutcome};
