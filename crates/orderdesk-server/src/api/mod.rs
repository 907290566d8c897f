mod import;
mod locations;
mod maintenance;
mod settings;

use std::future::Future;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use orderdesk_sync::{DebugLog, SyncContext, SyncError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub sync: SyncContext,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct HealthData {
    status: &'static str,
    database: &'static str,
    duplicate_orders: i64,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &orderdesk_db::DbError) -> ApiError {
    tracing::error!(request_id = request_id.as_str(), error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Failure body shared by the `/functions/v1` routes:
/// `{ success: false, error, debugMessages }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionFailure {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    error: String,
    debug_messages: Vec<String>,
}

impl FunctionFailure {
    pub(super) fn from_sync(request_id: &str, err: &SyncError, debug_messages: Vec<String>) -> Self {
        let status = status_for(err);
        if status.is_server_error() {
            tracing::error!(request_id, error = %err, "sync operation failed");
        } else {
            tracing::warn!(request_id, error = %err, "sync operation rejected");
        }
        Self {
            status,
            success: false,
            error: err.to_string(),
            debug_messages,
        }
    }
}

impl IntoResponse for FunctionFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// 409 for a held lock, 400 for bad input or missing configuration, 500 for
/// everything else (including upstream Shopify failures).
pub(super) fn status_for(err: &SyncError) -> StatusCode {
    match err {
        SyncError::Busy { .. } => StatusCode::CONFLICT,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Runs a pipeline on its own task and waits for it. A client that hangs up
/// drops only the wait; the pipeline keeps running and releases its lock.
pub(super) async fn run_detached<T, Fut>(
    operation: &'static str,
    pipeline: impl FnOnce(DebugLog) -> Fut,
) -> (Result<T, SyncError>, DebugLog)
where
    T: Send + 'static,
    Fut: Future<Output = (Result<T, SyncError>, DebugLog)> + Send + 'static,
{
    match tokio::spawn(pipeline(DebugLog::new(operation))).await {
        Ok(done) => done,
        Err(e) => {
            let mut log = DebugLog::new(operation);
            let err = SyncError::Task(format!("{operation} task failed: {e}"));
            log.error(err.to_string());
            (Err(err), log)
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("x-request-id"),
        ])
}

fn function_router() -> Router<AppState> {
    Router::new()
        .route(
            "/functions/v1/shopify-import-all",
            post(import::import_all),
        )
        .route(
            "/functions/v1/shopify-import-order",
            post(import::import_order),
        )
        .route(
            "/functions/v1/shopify-sync-locations",
            post(locations::sync_locations),
        )
        .route(
            "/functions/v1/shopify-database-cleanup",
            post(maintenance::database_cleanup),
        )
        .route(
            "/functions/v1/shopify-complete-refresh",
            post(maintenance::complete_refresh),
        )
        .route(
            "/functions/v1/restore-archived-orders",
            post(maintenance::restore_archived_orders),
        )
        .route(
            "/functions/v1/import-progress",
            get(import::import_progress),
        )
}

fn rpc_router() -> Router<AppState> {
    Router::new()
        .route(
            "/rest/v1/rpc/get_shopify_setting",
            post(settings::get_shopify_setting),
        )
        .route(
            "/rest/v1/rpc/upsert_shopify_setting",
            post(settings::upsert_shopify_setting),
        )
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .merge(function_router())
        .merge(rpc_router())
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match orderdesk_db::health_check(&state.sync.pool).await {
        Ok(report) => {
            if report.duplicate_orders > 0 {
                tracing::warn!(
                    duplicate_orders = report.duplicate_orders,
                    "orders present in both active and archived tables"
                );
            }
            (
                StatusCode::OK,
                Json(ApiResponse {
                    data: HealthData {
                        status: "ok",
                        database: "ok",
                        duplicate_orders: report.duplicate_orders,
                    },
                    meta,
                }),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        duplicate_orders: 0,
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
