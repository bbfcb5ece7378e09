pub mod health;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::quotation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/meta", get(handlers::handle_meta))
        // Quotation API
        .route("/api/v1/quotations", post(handlers::handle_generate))
        .route(
            "/api/v1/quotations/preview",
            post(handlers::handle_preview),
        )
        .route(
            "/api/v1/quotations/schema",
            get(handlers::handle_schema),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// CORS for the browser frontend: the listed origins, or any origin when
/// the list is empty.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
