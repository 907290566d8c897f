use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

use super::{run_detached, status_for, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SyncLocationsRequest {
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    continuation_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncLocationsResponse {
    success: bool,
    updated: u64,
    total_processed: u64,
    processing_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rate_limit_remaining: Option<u32>,
    /// Milliseconds since the backfill began.
    time_elapsed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    debug_messages: Vec<String>,
}

pub(super) async fn sync_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SyncLocationsRequest>,
) -> impl IntoResponse {
    let ctx = state.sync;
    let (result, log) = run_detached("sync-locations", move |mut log| async move {
        let result = orderdesk_sync::sync_locations_step(
            &ctx,
            body.api_token.as_deref(),
            body.continuation_token.as_deref(),
            &mut log,
        )
        .await;
        (result, log)
    })
    .await;

    match result {
        Ok(step) => (
            StatusCode::OK,
            Json(SyncLocationsResponse {
                success: true,
                updated: step.updated,
                total_processed: step.total_processed,
                processing_complete: step.processing_complete,
                continuation_token: step.continuation_token.map(|t| t.encode()),
                rate_limit_remaining: step.rate_limit_remaining,
                time_elapsed: step.time_elapsed_ms,
                error: None,
                debug_messages: log.into_messages(),
            }),
        ),
        Err(e) => {
            let status = status_for(&e);
            tracing::warn!(request_id = req_id.0.as_str(), error = %e, "location sync step failed");
            (
                status,
                Json(SyncLocationsResponse {
                    success: false,
                    updated: 0,
                    total_processed: 0,
                    processing_complete: false,
                    continuation_token: None,
                    rate_limit_remaining: None,
                    time_elapsed: 0,
                    error: Some(e.to_string()),
                    debug_messages: log.into_messages(),
                }),
            )
        }
    }
}
