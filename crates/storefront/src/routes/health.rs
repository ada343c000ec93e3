//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable unless both the REST and GraphQL APIs
/// answer.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let (rest, graphql) = tokio::join!(state.cms().rest().ping(), state.cms().graphql().ping());
    match (rest, graphql) {
        (Ok(()), Ok(())) => StatusCode::OK,
        (rest, graphql) => {
            if let Err(e) = rest {
                tracing::warn!(error = %e, "REST API not ready");
            }
            if let Err(e) = graphql {
                tracing::warn!(error = %e, "GraphQL API not ready");
            }
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
