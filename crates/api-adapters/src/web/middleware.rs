//! Middleware for tracing, request ids and CORS.

use std::time::Duration;

use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// Wraps the router with the standard layer stack. Layers run outermost
/// last-added, so the request id is assigned before tracing sees the request.
pub fn apply(router: Router) -> Router {
    router
        .layer(cors_policy())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

// Configures CORS (Cross-Origin Resource Sharing)
// The directory front-end is served from a different origin than the API.
pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}
