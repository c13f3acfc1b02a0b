use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::measure::MeasurementRequest;
use crate::server::AppState;
use crate::stats;

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /measure
///
/// Validation failures come back as 400; a batch that failed mid-flight is
/// still a 200 with the partial result and its `error` field set.
pub(crate) async fn measure(
    State(state): State<AppState>,
    Json(request): Json<MeasurementRequest>,
) -> Response {
    match state.orchestrator.run(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) if e.is_validation() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            let message = e.to_string();
            error!(error = message.as_str(), "measurement failed unexpectedly");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    limit: Option<usize>,
}

/// GET /history?limit=N — most recent entries, newest first.
pub(crate) async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query.limit.unwrap_or_else(|| state.history.capacity());
    Json(state.history.list(limit)).into_response()
}

/// GET /stats — aggregates grouped by transport backend.
pub(crate) async fn stats(State(state): State<AppState>) -> Response {
    Json(stats::aggregate(&state.history.snapshot())).into_response()
}

/// GET /healthz
pub(crate) async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
