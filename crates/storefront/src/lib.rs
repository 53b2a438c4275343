//! Toko Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused. The binary in `main.rs` wires it to
//! `PostgreSQL`; the integration tests wire it to in-memory adapters.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::db::Storage;
use crate::state::AppState;

/// Apply the storefront middleware stack to `routes` and attach `state`.
///
/// Layers, outermost first: request tracing, request ID, sessions. Static
/// assets are served from `crates/storefront/static`.
pub fn build_app<S, Store>(
    routes: Router<AppState<S>>,
    state: AppState<S>,
    session_store: Store,
) -> Router
where
    S: Storage,
    Store: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(session_store, state.config());

    routes
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
