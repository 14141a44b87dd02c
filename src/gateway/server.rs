//! # Gateway Server
//!
//! Router assembly and the serve loop. The state wired into every handler
//! is explicit: the pool, the forwarder, and the fetcher are constructed by
//! the binary and passed in, never reached through ambient globals.

use crate::config::Settings;
use crate::gateway::{proxy_api, request_api};
use crate::orchestration::{Fetcher, Forwarder, ProxyPool};
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use log::info;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// The live proxy pool.
    pub pool: Arc<ProxyPool>,

    /// The retry/switch forwarder.
    pub forwarder: Arc<Forwarder>,

    /// Fetcher handle for the source-probing endpoint; shares the registry
    /// (and its rotation cursor) with the pool's own fetcher.
    pub fetcher: Fetcher,
}

/// An internal failure surfaced as HTTP 500 with the message as `detail`.
pub struct ApiError(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.0 })),
        )
            .into_response()
    }
}

/// Assembles the full route table over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(proxy_api::banner))
        .route("/health", get(proxy_api::health))
        .route("/api/proxy/list", get(proxy_api::list_proxies))
        .route("/api/proxy/random", get(proxy_api::random_proxy))
        .route("/api/proxy/stats", get(proxy_api::pool_stats))
        .route("/api/proxy/test-sources", get(proxy_api::test_sources))
        .route("/api/proxy/update", post(proxy_api::trigger_update))
        .route("/api/proxy/:id", delete(proxy_api::delete_proxy))
        .route("/api/request", post(request_api::forward_request))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Binds the configured address and serves until ctrl-c.
///
/// # Errors
///
/// Returns the underlying I/O error when the bind fails or the server
/// loop aborts; the binary turns that into a non-zero exit.
pub async fn serve(settings: &Settings, state: AppState) -> std::io::Result<()> {
    let address = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(address.as_str()).await?;
    info!("Gateway listening on {address}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::source::SourceRegistry;
    use crate::inspection::Validator;
    use crate::io::http::Requestor;
    use crate::testutil::{RELAY_OK, relay_proxy, spawn_stub_relay};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let settings = Settings::default();
        let registry = Arc::new(SourceRegistry::new(Vec::new()));
        let fetcher = Fetcher::new(Arc::clone(&registry), Requestor::new());
        let validator = Validator::from_settings(&settings);
        let pool = Arc::new(ProxyPool::new(&settings, fetcher.clone(), validator));
        let forwarder = Arc::new(Forwarder::new(Arc::new(Requestor::new()), &settings));

        AppState {
            pool,
            forwarder,
            fetcher,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn banner_reports_identity() {
        let router = build_router(test_state());
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "proxyforge");
        assert_eq!(body["docs"], "/docs");
    }

    #[tokio::test]
    async fn health_includes_pool_stats() {
        let router = build_router(test_state());
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["proxy_pool"]["total_proxies"], 0);
    }

    #[tokio::test]
    async fn list_on_empty_pool_is_successful_and_empty() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::get("/api/proxy/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn random_on_empty_pool_reports_failure_with_200() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::get("/api/proxy/random")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn deleting_unknown_proxy_reports_failure_with_200() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::delete("/api/proxy/no-such-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn forwarding_goes_through_a_pool_relay() {
        let state = test_state();
        let relay = relay_proxy(spawn_stub_relay(RELAY_OK).await);
        let relay_url = relay.proxy_url();
        state.pool.admit(vec![relay]).await;

        let router = build_router(state);
        let payload = r#"{"url": "http://upstream.invalid/ok", "method": "GET", "timeout": 5}"#;
        let response = router
            .oneshot(
                Request::post("/api/request")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status_code"], 200);
        assert_eq!(body["data"]["proxy_used"], relay_url.as_str());
        assert_eq!(body["data"]["content"], "ok");
    }

    #[tokio::test]
    async fn exhausted_forwarding_is_a_500_with_detail() {
        let router = build_router(test_state());

        // Empty pool: every slot falls back to a direct send against a
        // port nothing listens on.
        let payload = r#"{"url": "http://127.0.0.1:9/", "method": "GET", "timeout": 2, "max_proxy_switches": 2}"#;
        let response = router
            .oneshot(
                Request::post("/api/request")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("请求失败"));
    }

    #[tokio::test]
    async fn manual_update_reports_stats() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::post("/api/proxy/update")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total_proxies"], 0);
    }

    #[tokio::test]
    async fn test_sources_on_empty_registry() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::get("/api/proxy/test-sources")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total_sources"], 0);
        assert_eq!(body["data"]["total_proxies"], 0);
    }
}
