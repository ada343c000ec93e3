//! Fernleaf storefront library.
//!
//! Server-rendered shop front for a headless WordPress/WooCommerce backend.
//! The binary in `main.rs` only wires configuration, telemetry, and the
//! listener; everything else lives here so integration tests can mount the
//! full [`app`] against a mock CMS.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod cms;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod resolver;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, Request, header::CACHE_CONTROL},
    middleware::{from_fn, from_fn_with_state},
};
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::state::AppState;

/// Directory static assets are served from, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    // Derived assets carry a content hash in their filename
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        ))
        .service(ServeDir::new(STATIC_DIR));

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .layer(session_layer)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<axum::body::Body>| {
                // request_id is recorded by the request ID middleware
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
