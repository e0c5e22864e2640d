//! # API Endpoint Handlers

use super::{
    AppState,
    types::{EventResponse, HealthResponse, StatusResponse},
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::shared::with_ingestor;
use obsgraph_core::{IndexTable, ObsError, TripleStore};

/// HTTP status for a failed event load.
fn error_status(e: &ObsError) -> StatusCode {
    match e {
        ObsError::Decode(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Row counts for the three index tables.
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let counts = with_ingestor(&state.ingestor, |ingestor| {
        let keyspace = ingestor.namespace().name().to_string();
        let store = ingestor.store();
        let rows = IndexTable::ALL
            .iter()
            .map(|table| store.count_rows(&keyspace, *table))
            .collect::<Result<Vec<u64>, ObsError>>()?;
        Ok((keyspace, store.is_persistent(), rows))
    })
    .await;

    match counts {
        Ok((keyspace, persistent, rows)) => match rows.as_slice() {
            &[spo_rows, pos_rows, osp_rows] => {
                let response = StatusResponse {
                    keyspace,
                    persistent,
                    spo_rows,
                    pos_rows,
                    osp_rows,
                };
                (StatusCode::OK, Json(response)).into_response()
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(EventResponse::error(e.to_string())),
        )
            .into_response(),
    }
}

// =============================================================================
// EVENT HANDLER
// =============================================================================

/// Load one JSON-encoded event.
///
/// The body is decoded here rather than through the `Json` extractor so a
/// malformed event is reported with the loader's own decode error.
pub async fn event_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match with_ingestor(&state.ingestor, move |ingestor| ingestor.handle_message(&body)).await {
        Ok(outcome) => (StatusCode::ACCEPTED, Json(EventResponse::from(outcome))),
        Err(e) => (
            error_status(&e),
            Json(EventResponse::error(e.to_string())),
        ),
    }
}
