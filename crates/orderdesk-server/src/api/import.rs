use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use orderdesk_core::ImportStatus;
use orderdesk_sync::ImportCounts;
use serde::{Deserialize, Serialize};

use super::{run_detached, AppState, FunctionFailure};
use crate::middleware::RequestId;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportAllRequest {
    #[serde(default)]
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportOrderRequest {
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    order_number: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportedCounts {
    orders: u64,
    line_items: u64,
}

impl From<ImportCounts> for ImportedCounts {
    fn from(counts: ImportCounts) -> Self {
        Self {
            orders: counts.orders,
            line_items: counts.line_items,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportAllResponse {
    success: bool,
    imported: ImportedCounts,
    debug_messages: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportOrderResponse {
    success: bool,
    imported: u64,
    line_items: u64,
    message: String,
    debug_messages: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportProgressResponse {
    status: ImportStatus,
    orders_imported: u64,
    lines_imported: u64,
    active_orders: u64,
    active_line_items: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_sync_time: Option<DateTime<Utc>>,
    auto_import_enabled: bool,
}

pub(super) async fn import_all(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ImportAllRequest>,
) -> Result<impl IntoResponse, FunctionFailure> {
    let ctx = state.sync;
    let (result, log) = run_detached("import-all", move |mut log| async move {
        let result =
            orderdesk_sync::import_all_orders(&ctx, body.api_token.as_deref(), &mut log).await;
        (result, log)
    })
    .await;

    match result {
        Ok(counts) => Ok(Json(ImportAllResponse {
            success: true,
            imported: counts.into(),
            debug_messages: log.into_messages(),
        })),
        Err(e) => Err(FunctionFailure::from_sync(&req_id.0, &e, log.into_messages())),
    }
}

pub(super) async fn import_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ImportOrderRequest>,
) -> Result<impl IntoResponse, FunctionFailure> {
    let ctx = state.sync;
    let (result, log) = run_detached("import-order", move |mut log| async move {
        let result = orderdesk_sync::import_single_order(
            &ctx,
            body.api_token.as_deref(),
            &body.order_number,
            &mut log,
        )
        .await;
        (result, log)
    })
    .await;

    match result {
        Ok(outcome) => Ok(Json(ImportOrderResponse {
            success: true,
            imported: outcome.imported,
            line_items: outcome.line_items,
            message: outcome.message,
            debug_messages: log.into_messages(),
        })),
        Err(e) => Err(FunctionFailure::from_sync(&req_id.0, &e, log.into_messages())),
    }
}

pub(super) async fn import_progress(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match orderdesk_sync::import_progress(&state.sync.pool).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ImportProgressResponse {
                status: report.progress.status,
                orders_imported: report.progress.orders_imported,
                lines_imported: report.progress.lines_imported,
                active_orders: report.active_orders,
                active_line_items: report.active_line_items,
                last_sync_time: report.progress.last_sync_time,
                auto_import_enabled: report.progress.auto_import_enabled,
            }),
        )
            .into_response(),
        Err(e) => FunctionFailure::from_sync(&req_id.0, &e, Vec::new()).into_response(),
    }
}
