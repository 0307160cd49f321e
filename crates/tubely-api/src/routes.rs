//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::config::{MULTIPART_ENVELOPE_BYTES, THUMBNAIL_MAX_BYTES};
use crate::handlers::{create_video, get_video, health, ready, upload_thumbnail, upload_video};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, expose_error_details, request_id, request_logging, security_headers,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let max_upload = state.ingest.config().max_upload_bytes;
    let upload_limit = usize::try_from(max_upload)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_ENVELOPE_BYTES);

    let video_routes = Router::new()
        .route("/videos", post(create_video))
        .route("/videos/:video_id", get(get_video))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size));

    // Video bodies are streamed to disk; only the outer limit applies
    let upload_routes = Router::new()
        .route("/video_upload/:video_id", post(upload_video))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(upload_limit));

    let thumbnail_routes = Router::new()
        .route("/thumbnail_upload/:video_id", post(upload_thumbnail))
        .layer(DefaultBodyLimit::max(
            THUMBNAIL_MAX_BYTES + MULTIPART_ENVELOPE_BYTES,
        ));

    let api_routes = Router::new()
        .merge(video_routes)
        .merge(upload_routes)
        .merge(thumbnail_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/assets", ServeDir::new(&state.config.assets_root))
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            expose_error_details,
        ))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
