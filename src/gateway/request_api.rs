//! # Request API
//!
//! The forwarding endpoint: accepts a request specification, runs it
//! through the retry/switch forwarder against the pool, and returns the
//! captured upstream response.

use crate::definitions::request::{ApiResponse, ForwardResponse, RequestSpec};
use crate::gateway::server::{ApiError, AppState};
use axum::{Json, extract::State};
use log::info;

/// `POST /api/request` - forward a request through the pool.
///
/// Success means the upstream answered, whatever its status; the status
/// code lives inside the response payload. Exhausting every proxy and
/// retry surfaces as HTTP 500 with the aggregated failure as `detail`.
pub async fn forward_request(
    State(state): State<AppState>,
    Json(spec): Json<RequestSpec>,
) -> Result<Json<ApiResponse<ForwardResponse>>, ApiError> {
    info!("Forwarding request: {} {}", spec.method, spec.url);

    let response = state
        .forwarder
        .forward(&spec, state.pool.as_ref())
        .await
        .map_err(|e| ApiError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Request forwarded",
        Some(response),
    )))
}
