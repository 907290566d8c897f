//! Destructive and bulk operations: cleanup, complete refresh, restore.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use orderdesk_shopify::OrderFilters;
use serde::{Deserialize, Serialize};

use super::import::ImportedCounts;
use super::{run_detached, status_for, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshRequest {
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    filters: Option<OrderFilters>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RestoreRequest {
    #[serde(default)]
    only_unfulfilled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResponse {
    success: bool,
    cleaned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    debug_messages: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    success: bool,
    cleaned: bool,
    imported: ImportedCounts,
    sync_started: bool,
    sync_complete: bool,
    import_in_background: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    debug_messages: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RestoreResponse {
    success: bool,
    restored: u64,
    skipped: u64,
    failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    debug_messages: Vec<String>,
}

/// The request body (`{ apiToken }`) is accepted but not needed: cleanup
/// never calls Shopify.
pub(super) async fn database_cleanup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let ttl = state.sync.config.lock_ttl_secs;
    let pool = state.sync.pool;
    let (result, log) = run_detached("cleanup", move |mut log| async move {
        let result = orderdesk_sync::cleanup_database(&pool, ttl, &mut log).await;
        (result, log)
    })
    .await;

    match result {
        Ok(outcome) => {
            tracing::info!(
                request_id = req_id.0.as_str(),
                items = outcome.items_deleted,
                orders = outcome.orders_deleted,
                "database cleaned"
            );
            (
                StatusCode::OK,
                Json(CleanupResponse {
                    success: true,
                    cleaned: true,
                    error: None,
                    debug_messages: log.into_messages(),
                }),
            )
        }
        Err(e) => {
            tracing::error!(request_id = req_id.0.as_str(), error = %e, "database cleanup failed");
            (
                status_for(&e),
                Json(CleanupResponse {
                    success: false,
                    cleaned: false,
                    error: Some(e.to_string()),
                    debug_messages: log.into_messages(),
                }),
            )
        }
    }
}

pub(super) async fn complete_refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RefreshRequest>,
) -> impl IntoResponse {
    let ctx = state.sync;
    let (result, log) = run_detached("refresh", move |mut log| async move {
        let result = orderdesk_sync::complete_refresh(
            &ctx,
            body.api_token.as_deref(),
            body.filters,
            &mut log,
        )
        .await;
        (result, log)
    })
    .await;

    let (status, response) = match result {
        Ok(outcome) => {
            let status = if outcome.error.is_some() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (
                status,
                RefreshResponse {
                    success: outcome.error.is_none(),
                    cleaned: outcome.cleaned,
                    imported: outcome.imported.into(),
                    sync_started: outcome.sync_started,
                    sync_complete: outcome.sync_complete,
                    import_in_background: outcome.import_in_background,
                    error: outcome.error,
                    debug_messages: Vec::new(),
                },
            )
        }
        Err(e) => {
            tracing::warn!(request_id = req_id.0.as_str(), error = %e, "complete refresh rejected");
            (
                status_for(&e),
                RefreshResponse {
                    success: false,
                    cleaned: false,
                    imported: orderdesk_sync::ImportCounts::default().into(),
                    sync_started: false,
                    sync_complete: false,
                    import_in_background: false,
                    error: Some(e.to_string()),
                    debug_messages: Vec::new(),
                },
            )
        }
    };

    let response = RefreshResponse {
        debug_messages: log.into_messages(),
        ..response
    };
    (status, Json(response))
}

pub(super) async fn restore_archived_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RestoreRequest>,
) -> impl IntoResponse {
    let ttl = state.sync.config.lock_ttl_secs;
    let pool = state.sync.pool;
    let (result, log) = run_detached("restore", move |mut log| async move {
        let result =
            orderdesk_sync::restore_archived_orders(&pool, body.only_unfulfilled, ttl, &mut log)
                .await;
        (result, log)
    })
    .await;

    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(RestoreResponse {
                success: true,
                restored: outcome.restored,
                skipped: outcome.skipped,
                failed: outcome.failed,
                error: None,
                debug_messages: log.into_messages(),
            }),
        ),
        Err(e) => {
            tracing::error!(request_id = req_id.0.as_str(), error = %e, "restore failed");
            (
                status_for(&e),
                Json(RestoreResponse {
                    success: false,
                    restored: 0,
                    skipped: 0,
                    failed: 0,
                    error: Some(e.to_string()),
                    debug_messages: log.into_messages(),
                }),
            )
        }
    }
}
