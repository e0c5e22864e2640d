//! # obsgraph
//!
//! Boundary adapters around `obsgraph-core`: configuration, the line
//! consumer, the HTTP ingest API and the shared ingestor they run on. The binary in `main.rs` wires them to
//! the command line.

pub mod api;
pub mod config;
pub mod consumer;
pub mod shared;
