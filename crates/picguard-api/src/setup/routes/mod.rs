//! Route configuration and setup.

pub mod health;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use picguard_core::Config;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::constants::{HEALTH_ROUTE, OPENAPI_ROUTE, UPLOAD_ROUTE};
use crate::handlers::image_upload::upload_image;
use crate::middleware::{security_headers_middleware, serve_upload_dir, SecurityHeadersConfig};
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    // Body limit sits just above the file ceiling; the handler enforces the
    // exact limit on streamed bytes.
    let body_limit = state.policy().max_request_size();

    let upload_routes = Router::new()
        .route(UPLOAD_ROUTE, post(upload_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state.clone());

    let security_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));

    let router = Router::new()
        .route(HEALTH_ROUTE, get(health::liveness_check))
        .route(OPENAPI_ROUTE, get(|| async { Json(ApiDoc::openapi()) }))
        .merge(upload_routes)
        .nest_service(config.public_prefix(), serve_upload_dir(state.store.base_path()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs()),
        ))
        .layer(axum::middleware::from_fn_with_state(
            security_config,
            security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    tracing::info!(
        upload_route = UPLOAD_ROUTE,
        public_prefix = %config.public_prefix(),
        body_limit_bytes = body_limit,
        "Routes configured"
    );

    Ok(router)
}
