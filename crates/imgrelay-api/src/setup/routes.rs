//! Route configuration and setup.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use imgrelay_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Room for multipart framing and the base64 inflation of the image field.
fn body_limit(config: &Config) -> usize {
    config.max_file_size_bytes + 1024 * 1024
}

/// Build the relay router with CORS, tracing, and body-limit layers applied.
pub fn build_router(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(&state.config)?;
    let limit = body_limit(&state.config);

    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/upload", post(handlers::upload::upload_image))
        .route(
            "/api/upload/{delete_hash}",
            delete(handlers::upload::delete_image),
        )
        .route("/api/proxy-image", get(handlers::proxy::proxy_image))
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    if config.cors_origins.iter().any(|o| o == "*") {
        Ok(cors.allow_origin(Any))
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", o))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cors.allow_origin(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use serde_json::Value;

    fn test_server() -> TestServer {
        let state = Arc::new(AppState::new(Config::default()).unwrap());
        TestServer::new(build_router(state).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = test_server();
        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_without_image_part_is_400() {
        let server = test_server();
        let form = axum_test::multipart::MultipartForm::new().add_text("caption", "not a file");

        let response = server.post("/api/upload").multipart(form).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No image provided");
    }

    #[tokio::test]
    async fn test_proxy_without_url_is_400() {
        let server = test_server();
        let response = server.get("/api/proxy-image").await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "No URL provided");
    }

    #[tokio::test]
    async fn test_proxy_with_malformed_url_is_400() {
        let server = test_server();
        let response = server
            .get("/api/proxy-image")
            .add_query_param("url", "not a url")
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid URL");
    }
}
