//! # obsgraph CLI Module
//!
//! ## Available Commands
//!
//! - `init` - Create the schema and seed the vocabulary
//! - `consume` - Load newline-delimited JSON events from stdin or a file
//! - `serve` - Start the HTTP ingest server
//! - `status` - Show row counts per index table
//! - `map` - Print the statements events map to, without touching a store

mod commands;

use clap::{Parser, Subcommand};
use obsgraph::config::{BackendKind, Config, Overrides};
use obsgraph_core::ObsError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// obsgraph - network observation loader
///
/// Maps probe events to graph statements and stores each statement under
/// three key orderings.
#[derive(Parser, Debug)]
#[command(name = "obsgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (replaces configured contact points)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Namespace holding the index tables
    #[arg(short = 'k', long, global = true)]
    pub keyspace: Option<String>,

    /// Storage backend: "redb" (persistent) or "memory" (volatile)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<BackendKind>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the namespace and index tables, seed the vocabulary
    Init,

    /// Load newline-delimited JSON events
    Consume {
        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Start the HTTP ingest server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show row counts per index table
    Status,

    /// Print mapped statements as JSON lines (dry run)
    Map {
        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            database: self.database.clone(),
            keyspace: self.keyspace.clone(),
            backend: self.backend,
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), ObsError> {
    let json_mode = cli.json_mode;
    let overrides = cli.overrides();
    let load = || Config::load(cli.config.as_deref(), &overrides);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Init => cmd_init(&load()?, json_mode).await,
        Commands::Consume { input } => cmd_consume(&load()?, json_mode, input.as_deref()).await,
        Commands::Serve { host, port } => cmd_serve(&load()?, &host, port).await,
        Commands::Status => cmd_status(&load()?, json_mode).await,
        // The dry run needs no store and so no configuration.
        Commands::Map { input } => cmd_map(input.as_deref()),
    }
}
