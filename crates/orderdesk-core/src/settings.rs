//! Typed view over the string-keyed `shopify_settings` table.
//!
//! The table stores every value as text (`"true"`, `"42"`, RFC 3339
//! timestamps). Values are parsed into the types below at the store boundary
//! and serialized back with [`ImportStatus::as_str`] / `to_string`, so the
//! persisted format stays readable by the dashboard.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Token value the dashboard writes when no token has been configured.
pub const PLACEHOLDER_TOKEN: &str = "placeholder_token";

/// Recognized setting names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingName {
    ShopifyToken,
    ShopifyApiEndpoint,
    LastSyncTime,
    AutoImportEnabled,
    ImportStatus,
    OrdersImported,
    LinesImported,
}

impl SettingName {
    pub const ALL: [SettingName; 7] = [
        SettingName::ShopifyToken,
        SettingName::ShopifyApiEndpoint,
        SettingName::LastSyncTime,
        SettingName::AutoImportEnabled,
        SettingName::ImportStatus,
        SettingName::OrdersImported,
        SettingName::LinesImported,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SettingName::ShopifyToken => "shopify_token",
            SettingName::ShopifyApiEndpoint => "shopify_api_endpoint",
            SettingName::LastSyncTime => "last_sync_time",
            SettingName::AutoImportEnabled => "auto_import_enabled",
            SettingName::ImportStatus => "shopify_import_status",
            SettingName::OrdersImported => "shopify_orders_imported",
            SettingName::LinesImported => "shopify_orders_lines_imported",
        }
    }

    /// Returns the matching variant for a raw setting name, if recognized.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the `shopify_import_status` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    #[default]
    Idle,
    Importing,
    Complete,
    Error,
    /// The refresh orchestrator stopped waiting; the import keeps running.
    Background,
}

impl ImportStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Idle => "idle",
            ImportStatus::Importing => "importing",
            ImportStatus::Complete => "complete",
            ImportStatus::Error => "error",
            ImportStatus::Background => "background",
        }
    }

    /// Lenient parse used when reading the store: absent or unknown values
    /// read as [`ImportStatus::Idle`].
    #[must_use]
    pub fn from_setting(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "idle" => Ok(ImportStatus::Idle),
            "importing" => Ok(ImportStatus::Importing),
            "complete" => Ok(ImportStatus::Complete),
            "error" => Ok(ImportStatus::Error),
            "background" => Ok(ImportStatus::Background),
            other => Err(CoreError::UnknownImportStatus(other.to_string())),
        }
    }
}

/// Progress counters polled by the dashboard while an import runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProgress {
    pub status: ImportStatus,
    pub orders_imported: u64,
    pub lines_imported: u64,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub auto_import_enabled: bool,
}

impl ImportProgress {
    /// Builds progress from raw setting values. Malformed counters read as
    /// zero and a malformed timestamp reads as absent.
    #[must_use]
    pub fn from_raw(
        status: Option<&str>,
        orders_imported: Option<&str>,
        lines_imported: Option<&str>,
        last_sync_time: Option<&str>,
        auto_import_enabled: Option<&str>,
    ) -> Self {
        Self {
            status: ImportStatus::from_setting(status),
            orders_imported: parse_counter(orders_imported),
            lines_imported: parse_counter(lines_imported),
            last_sync_time: last_sync_time
                .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            auto_import_enabled: parse_flag(auto_import_enabled),
        }
    }
}

/// Parses a stringified counter. Anything unparseable counts as zero.
#[must_use]
pub fn parse_counter(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

/// Only the exact string `"true"` enables a flag.
#[must_use]
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|s| s.trim() == "true")
}

/// Shopify credentials resolved from a request and the settings store.
#[derive(Clone)]
pub struct ShopifyCredentials {
    pub token: String,
    pub endpoint: String,
}

impl fmt::Debug for ShopifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyCredentials")
            .field("token", &"[redacted]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Chooses the API token: an explicit request token wins over the stored
/// one. Empty values and [`PLACEHOLDER_TOKEN`] count as unset.
#[must_use]
pub fn resolve_token(request_token: Option<&str>, stored_token: Option<&str>) -> Option<String> {
    [request_token, stored_token]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty() && *t != PLACEHOLDER_TOKEN)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_names_round_trip() {
        for name in SettingName::ALL {
            assert_eq!(SettingName::from_name(name.as_str()), Some(name));
        }
        assert_eq!(SettingName::from_name("not_a_setting"), None);
    }

    #[test]
    fn import_status_parses_known_values() {
        assert_eq!("importing".parse::<ImportStatus>().unwrap(), ImportStatus::Importing);
        assert_eq!("background".parse::<ImportStatus>().unwrap(), ImportStatus::Background);
        assert!("paused".parse::<ImportStatus>().is_err());
    }

    #[test]
    fn import_status_from_setting_defaults_to_idle() {
        assert_eq!(ImportStatus::from_setting(None), ImportStatus::Idle);
        assert_eq!(ImportStatus::from_setting(Some("garbage")), ImportStatus::Idle);
        assert_eq!(ImportStatus::from_setting(Some("complete")), ImportStatus::Complete);
    }

    #[test]
    fn counters_tolerate_garbage() {
        assert_eq!(parse_counter(Some("12")), 12);
        assert_eq!(parse_counter(Some(" 7 ")), 7);
        assert_eq!(parse_counter(Some("-3")), 0);
        assert_eq!(parse_counter(Some("twelve")), 0);
        assert_eq!(parse_counter(None), 0);
    }

    #[test]
    fn flag_requires_exact_true() {
        assert!(parse_flag(Some("true")));
        assert!(!parse_flag(Some("TRUE")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn resolve_token_prefers_request_token() {
        assert_eq!(
            resolve_token(Some("shpat_req"), Some("shpat_stored")).as_deref(),
            Some("shpat_req")
        );
    }

    #[test]
    fn resolve_token_skips_placeholder_and_blank() {
        assert_eq!(
            resolve_token(Some("  "), Some("shpat_stored")).as_deref(),
            Some("shpat_stored")
        );
        assert_eq!(resolve_token(None, Some(PLACEHOLDER_TOKEN)), None);
        assert_eq!(resolve_token(Some(PLACEHOLDER_TOKEN), None), None);
    }

    #[test]
    fn progress_from_raw_parses_all_fields() {
        let progress = ImportProgress::from_raw(
            Some("complete"),
            Some("2"),
            Some("5"),
            Some("2026-03-01T10:00:00Z"),
            Some("true"),
        );
        assert_eq!(progress.status, ImportStatus::Complete);
        assert_eq!(progress.orders_imported, 2);
        assert_eq!(progress.lines_imported, 5);
        assert!(progress.last_sync_time.is_some());
        assert!(progress.auto_import_enabled);
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let creds = ShopifyCredentials {
            token: "shpat_secret".to_string(),
            endpoint: "https://shop.example.com/admin/api/2023-07/orders.json".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("shpat_secret"));
    }
}
