//! Database guard middleware.
//!
//! Acquires the shared connection before any request that touches storage
//! and attaches it to the request as a [`DbConnection`] extension. The whole
//! acquisition races the configured deadline so the request fails fast with
//! a structured 503 instead of hanging past the platform's execution limit.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::connection::ConnectionHandle;
use crate::http::response::ErrorResponse;
use crate::http::server::AppState;

/// Request extension carrying the acquired handle.
#[derive(Debug, Clone)]
pub struct DbConnection(pub ConnectionHandle);

pub async fn db_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.skips_database(request.uri().path()) {
        return next.run(request).await;
    }

    let deadline = state.manager.config().acquire_timeout();
    match state.manager.acquire_connection_within(deadline).await {
        Ok(handle) => {
            request.extensions_mut().insert(DbConnection(handle));
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(
                path = %request.uri().path(),
                kind = %err.kind(),
                error = %err,
                "Database unavailable, rejecting request"
            );
            ErrorResponse(err).into_response()
        }
    }
}
