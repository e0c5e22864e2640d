//! # obsgraph - network observation loader
//!
//! The main binary for the obsgraph statement loader.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   apps/obsgraph (THE BINARY)                    │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │  HTTP API   │    │  Line consumer   │    │
//! │  │  (clap)     │    │   (axum)    │    │  (NDJSON)        │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                   ┌────────────────┐                           │
//! │                   │ obsgraph-core  │                           │
//! │                   │ (THE LOADER)   │                           │
//! │                   └────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! obsgraph init --database /var/lib/obsgraph/rdf.redb
//! probe-events | obsgraph consume
//! obsgraph serve --host 0.0.0.0 --port 8080
//! obsgraph status --json-mode
//! obsgraph map --input events.ndjson
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // OBSGRAPH_LOG_FORMAT=json enables machine-parseable output. Logs go to
    // stderr; stdout carries command output.
    let log_format = std::env::var("OBSGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "obsgraph=info,obsgraph_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode && !matches!(cli.command, Some(cli::Commands::Map { .. })) {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
   ___  _           ____                 _
  / _ \| |__  ___  / ___|_ __ __ _ _ __ | |__
 | | | | '_ \/ __|| |  _| '__/ _` | '_ \| '_ \
 | |_| | |_) \__ \| |_| | | | (_| | |_) | | | |
  \___/|_.__/|___/ \____|_|  \__,_| .__/|_| |_|
                                  |_|
  Observation loader v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
