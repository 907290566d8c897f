//! Passthrough for the settings database functions, addressed the way the
//! dashboard calls them.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;

use super::{map_db_error, AppState, ApiError};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct GetSettingParams {
    setting_name_param: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpsertSettingParams {
    setting_name_param: String,
    #[serde(default)]
    setting_value_param: Option<String>,
}

/// Returns the value as a bare JSON string, or `null`.
pub(super) async fn get_shopify_setting(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(params): Json<GetSettingParams>,
) -> Result<Json<Option<String>>, ApiError> {
    orderdesk_db::get_setting(&state.sync.pool, &params.setting_name_param)
        .await
        .map(Json)
        .map_err(|e| map_db_error(req_id.0, &e))
}

pub(super) async fn upsert_shopify_setting(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(params): Json<UpsertSettingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let name = params.setting_name_param.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "setting_name_param must not be empty",
        ));
    }

    let value = params.setting_value_param.unwrap_or_default();
    orderdesk_db::upsert_setting(&state.sync.pool, name, &value)
        .await
        .map_err(|e| map_db_error(req_id.0, &e))?;
    Ok(StatusCode::NO_CONTENT)
}
