//! # Proxy API
//!
//! Pool inspection and maintenance endpoints under `/api/proxy`, plus the
//! banner and health probes.

use crate::definitions::{defaults, proxy::Proxy, request::ApiResponse};
use crate::gateway::server::AppState;
use crate::orchestration::{PoolStats, SourceProbeReport};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Query parameters for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Only return currently-valid proxies. Defaults to true.
    pub valid_only: Option<bool>,

    /// Cap on how many proxies to return. Defaults to 100.
    pub limit: Option<usize>,
}

/// `GET /` - service identity.
pub async fn banner() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "docs": "/docs",
    }))
}

/// `GET /health` - liveness plus a pool snapshot.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let stats = state.pool.get_stats().await;
    Json(json!({
        "status": "healthy",
        "proxy_pool": stats,
    }))
}

/// `GET /api/proxy/list` - proxies, valid-only by default.
pub async fn list_proxies(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<ApiResponse<Vec<Proxy>>> {
    let valid_only = params.valid_only.unwrap_or(true);
    let limit = params.limit.unwrap_or(100);

    let mut proxies = if valid_only {
        state.pool.get_valid_proxies().await
    } else {
        state.pool.get_all_proxies().await
    };
    proxies.truncate(limit);

    Json(ApiResponse::success(
        format!("Listing {} proxies", proxies.len()),
        Some(proxies),
    ))
}

/// `GET /api/proxy/random` - the fastest valid proxy.
///
/// The historical route name promises randomness; selection is the fastest
/// valid relay, matching what clients of the original service observed.
pub async fn random_proxy(State(state): State<AppState>) -> Json<ApiResponse<Proxy>> {
    match state.pool.get_fastest_proxy().await {
        Some(proxy) => Json(ApiResponse::success("Proxy selected", Some(proxy))),
        None => Json(ApiResponse::failure("No proxy available")),
    }
}

/// `GET /api/proxy/stats` - pool counters.
pub async fn pool_stats(State(state): State<AppState>) -> Json<ApiResponse<PoolStats>> {
    let stats = state.pool.get_stats().await;
    Json(ApiResponse::success("Pool statistics", Some(stats)))
}

/// `DELETE /api/proxy/{id}` - evict one proxy.
///
/// An unknown id is an expected outcome, reported as `success: false` with
/// HTTP 200 rather than an error status.
pub async fn delete_proxy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ApiResponse<Value>> {
    if state.pool.remove_proxy(&id).await {
        Json(ApiResponse::success(format!("Removed proxy {id}"), None))
    } else {
        Json(ApiResponse::failure(format!("No such proxy: {id}")))
    }
}

/// `POST /api/proxy/update` - run a replenishment round now.
///
/// Waits for the round to finish and reports the resulting stats, so the
/// caller sees the pool state their trigger produced.
pub async fn trigger_update(State(state): State<AppState>) -> Json<ApiResponse<PoolStats>> {
    state.pool.update_pool().await;
    let stats = state.pool.get_stats().await;
    Json(ApiResponse::success("Pool updated", Some(stats)))
}

/// `GET /api/proxy/test-sources` - probe every listing once.
pub async fn test_sources(State(state): State<AppState>) -> Json<ApiResponse<SourceProbeReport>> {
    let report = state
        .fetcher
        .probe_all_sources(defaults::DEFAULT_PARALLEL_VALIDATIONS)
        .await;

    Json(ApiResponse::success(
        format!("Probed {} sources", report.total_sources),
        Some(report),
    ))
}
