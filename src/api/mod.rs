//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::http::HeaderName;
use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::store::LedgerStore;

pub use routes::create_router;

/// Build the application router over `store`
pub fn build_router<S: LedgerStore>(store: S) -> Router {
    let correlation_header = HeaderName::from_static(middleware::CORRELATION_ID_HEADER);

    // Layers run last-added first:
    // set request id -> trace -> propagate -> context -> logging -> handler
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_router::<S>())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::context_middleware))
        .layer(PropagateRequestIdLayer::new(correlation_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(correlation_header, MakeRequestUuid))
        .with_state(store)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
