//! # API Request/Response Types
//!
//! JSON bodies returned by the HTTP ingest surface.

use obsgraph_core::Outcome;
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Row counts per index table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub keyspace: String,
    pub persistent: bool,
    pub spo_rows: u64,
    pub pos_rows: u64,
    pub osp_rows: u64,
}

// =============================================================================
// EVENT RESPONSE
// =============================================================================

/// Result of posting one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    /// `written`, `skipped` or `error`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventResponse {
    /// Create an error response.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            statements: None,
            error: Some(msg.into()),
        }
    }
}

impl From<Outcome> for EventResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Written { statements } => Self {
                status: "written".to_string(),
                statements: Some(statements),
                error: None,
            },
            Outcome::Skipped { .. } => Self {
                status: "skipped".to_string(),
                statements: Some(0),
                error: None,
            },
        }
    }
}
