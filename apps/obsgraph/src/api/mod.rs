//! # obsgraph HTTP API Module
//!
//! HTTP ingest surface using axum.
//!
//! ## Endpoints
//!
//! - `POST /event` - Load one JSON-encoded event (202, 400 on decode error,
//!   503 on store error)
//! - `GET /status` - Row counts per index table
//! - `GET /health` - Health check
//!
//! ## Configuration (Environment Variables)
//!
//! - `OBSGRAPH_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*"
//!   for all (default: no cross-origin access)

mod handlers;
mod types;

pub use handlers::{event_handler, health_handler, status_handler};
pub use types::{EventResponse, HealthResponse, StatusResponse};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use crate::shared::{SharedIngestor, share};
use obsgraph_core::primitives::MAX_EVENT_BYTES;
use obsgraph_core::{Ingestor, ObsError, StoreBackend};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state holding the ingestor.
///
/// Every request takes the lock, so event writes are serialized.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: SharedIngestor<StoreBackend>,
}

impl AppState {
    /// Create new app state around a bootstrapped ingestor.
    #[must_use]
    pub fn new(ingestor: Ingestor<StoreBackend>) -> Self {
        Self {
            ingestor: share(ingestor),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `OBSGRAPH_CORS_ORIGINS`.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var("OBSGRAPH_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!("CORS: allowing all origins (OBSGRAPH_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| match s.trim().parse::<HeaderValue>() {
                    Ok(hv) => Some(hv),
                    Err(e) => {
                        tracing::warn!("CORS: invalid origin '{}': {}", s.trim(), e);
                        None
                    }
                })
                .collect();
            base.allow_origin(allowed)
        }
        None => base,
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/event", post(handlers::event_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(MAX_EVENT_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve until Ctrl+C.
pub async fn run_server(addr: &str, ingestor: Ingestor<StoreBackend>) -> Result<(), ObsError> {
    let router = create_router(AppState::new(ingestor));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ObsError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("obsgraph HTTP ingest listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ObsError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
