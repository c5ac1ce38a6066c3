//! API route definitions.

use axum::{Router, middleware, routing::get};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::proxy;
use super::state::AppState;
use crate::gate::gate_middleware;

/// Create the application router: every page is gated and proxied upstream.
pub fn create_router(state: AppState) -> Router {
    create_router_with_pages(state, Router::new())
}

/// Create the application router with locally served pages.
///
/// `pages` sit behind the gate like proxied paths; anything they don't match
/// falls through to the upstream proxy.
pub fn create_router_with_pages(state: AppState, pages: Router<AppState>) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let gate_state = state.gate.clone();

    // Public routes (no gating)
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .with_state(state.clone());

    let gated_routes = pages
        .fallback(proxy::forward_upstream)
        .layer(middleware::from_fn_with_state(gate_state, gate_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(gated_routes)
        .layer(trace_layer)
}
