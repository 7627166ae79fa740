//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with health handlers and the guarded storage routes
//! - Wire up middleware (tracing, request timeout, database guard)
//! - Bind server to listener and drain on shutdown
//! - Release the database handle once the server has stopped

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{AppConfig, ServerConfig};
use crate::connection::ConnectionManager;
use crate::http::guard::{db_guard, DbConnection};
use crate::http::response::ErrorResponse;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: ConnectionManager,
    pub server: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(manager: ConnectionManager, server: ServerConfig) -> Self {
        Self { manager, server: Arc::new(server) }
    }

    /// Health and static paths never touch the database.
    pub fn skips_database(&self, path: &str) -> bool {
        self.server.skip_paths.iter().any(|p| p == path)
            || self.server.skip_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// HTTP server for the storefront database service.
pub struct HttpServer {
    router: Router,
    manager: ConnectionManager,
}

impl HttpServer {
    /// Create a server exposing only the built-in routes.
    pub fn new(config: AppConfig, manager: ConnectionManager) -> Self {
        Self::with_routes(config, manager, Router::new())
    }

    /// Create a server that also mounts `app_routes` behind the database guard.
    pub fn with_routes(config: AppConfig, manager: ConnectionManager, app_routes: Router<AppState>) -> Self {
        let state = AppState::new(manager.clone(), config.server.clone());
        let router = Self::build_router(&config, state, app_routes);
        Self { router, manager }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, app_routes: Router<AppState>) -> Router {
        Router::new()
            .route("/api", get(health))
            .route("/api/health", get(health))
            .route("/api/db-health", get(db_health))
            .route("/api/db/session", get(session_info))
            .merge(app_routes)
            .layer(middleware::from_fn_with_state(state.clone(), db_guard))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs))),
            )
    }

    /// Run the server until the shutdown signal fires, then close the
    /// database handle.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        self.manager.shutdown().await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Acquire the connection and report the manager's view of it.
async fn db_health(State(state): State<AppState>) -> Response {
    let deadline = state.manager.config().acquire_timeout();
    match state.manager.acquire_connection_within(deadline).await {
        Ok(handle) => Json(json!({
            "status": "success",
            "message": "Connected to database",
            "handleId": handle.id().as_u64(),
            "connection": state.manager.status(),
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(kind = %err.kind(), error = %err, "Database health check failed");
            ErrorResponse(err).into_response()
        }
    }
}

async fn session_info(
    State(state): State<AppState>,
    Extension(DbConnection(handle)): Extension<DbConnection>,
) -> Json<serde_json::Value> {
    let age = handle.age(tokio::time::Instant::now());
    Json(json!({
        "handleId": handle.id().as_u64(),
        "ageMs": age.as_millis() as u64,
        "state": state.manager.status().state,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_rules() {
        let state = AppState::new(
            ConnectionManager::new(crate::connection::TcpDriver::new(1), Default::default()),
            ServerConfig::default(),
        );
        assert!(state.skips_database("/api/health"));
        assert!(state.skips_database("/api"));
        assert!(state.skips_database("/uploads/cat.png"));
        assert!(!state.skips_database("/api/products"));
        assert!(!state.skips_database("/api/healthz"));
    }
}
