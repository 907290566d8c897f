use clap::Parser;

use super::*;
use crate::import::{ImportCommands, LocationsCommands};
use crate::status::SettingsCommands;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["orderdesk-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["orderdesk-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn import_all_token_is_optional() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "import", "all"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Import {
            command: ImportCommands::All { token: None }
        })
    ));
}

#[test]
fn import_all_with_token() {
    let cli =
        Cli::try_parse_from(["orderdesk-cli", "import", "all", "--token", "shpat_abc"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Import {
            command: ImportCommands::All { token: Some(ref t) }
        }) if t == "shpat_abc"
    ));
}

#[test]
fn import_order_takes_number() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "import", "order", "#1042"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Import {
            command: ImportCommands::Order { ref number, token: None }
        }) if number == "#1042"
    ));
}

#[test]
fn import_order_requires_number() {
    assert!(Cli::try_parse_from(["orderdesk-cli", "import", "order"]).is_err());
}

#[test]
fn parses_locations_sync() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "locations", "sync"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Locations {
            command: LocationsCommands::Sync { token: None }
        })
    ));
}

#[test]
fn parses_cleanup_and_status() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "cleanup"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Cleanup)));

    let cli = Cli::try_parse_from(["orderdesk-cli", "status"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Status)));
}

#[test]
fn parses_refresh_with_token() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "refresh", "--token", "shpat_abc"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Refresh { token: Some(ref t) }) if t == "shpat_abc"
    ));
}

#[test]
fn restore_defaults_to_all_archived_orders() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "restore"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Restore {
            only_unfulfilled: false
        })
    ));

    let cli = Cli::try_parse_from(["orderdesk-cli", "restore", "--only-unfulfilled"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Restore {
            only_unfulfilled: true
        })
    ));
}

#[test]
fn parses_settings_get_and_set() {
    let cli = Cli::try_parse_from(["orderdesk-cli", "settings", "get", "auto_import_enabled"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Settings {
            command: SettingsCommands::Get { ref name }
        }) if name == "auto_import_enabled"
    ));

    let cli = Cli::try_parse_from([
        "orderdesk-cli",
        "settings",
        "set",
        "auto_import_enabled",
        "true",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Settings {
            command: SettingsCommands::Set { ref name, ref value }
        }) if name == "auto_import_enabled" && value == "true"
    ));
}

#[test]
fn settings_set_requires_value() {
    assert!(Cli::try_parse_from(["orderdesk-cli", "settings", "set", "shopify_token"]).is_err());
}
