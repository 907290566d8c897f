use orderdesk_core::{resolve_token, SettingName, ShopifyCredentials};
use sqlx::PgPool;

use crate::SyncError;

/// Resolves the API token (request first, then the `shopify_token` setting)
/// and the `shopify_api_endpoint` setting.
///
/// # Errors
///
/// Returns [`SyncError::Config`] when either is missing; the placeholder
/// token counts as missing. No network call is made.
pub async fn resolve_credentials(
    pool: &PgPool,
    request_token: Option<&str>,
) -> Result<ShopifyCredentials, SyncError> {
    let stored = orderdesk_db::get_setting(pool, SettingName::ShopifyToken.as_str()).await?;
    let token = resolve_token(request_token, stored.as_deref()).ok_or_else(|| {
        SyncError::Config("no Shopify API token provided or configured".to_string())
    })?;

    let endpoint = orderdesk_db::get_setting(pool, SettingName::ShopifyApiEndpoint.as_str())
        .await?
        .map(|e| e.trim().to_owned())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            SyncError::Config(format!(
                "{} is not configured",
                SettingName::ShopifyApiEndpoint
            ))
        })?;

    Ok(ShopifyCredentials { token, endpoint })
}
