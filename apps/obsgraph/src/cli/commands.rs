//! # CLI Command Implementations

use obsgraph::api;
use obsgraph::config::Config;
use obsgraph::consumer::{self, ConsumerStats};
use obsgraph::shared;
use obsgraph_core::{
    Event, IndexTable, Ingestor, ObsError, SchemaReport, StatementMapper, StoreBackend,
    TripleStore,
};
use std::io::BufRead;
use std::path::Path;

// =============================================================================
// STORE ACCESS
// =============================================================================

/// Connect to the configured store off the async runtime.
///
/// The connector sleeps between attempts, so it runs on the blocking pool.
async fn open_ingestor(config: &Config) -> Result<Ingestor<StoreBackend>, ObsError> {
    let opener = config.clone();
    tokio::task::spawn_blocking(move || {
        Ingestor::new(opener.open_backend()?, &opener.store.keyspace)
    })
    .await
    .map_err(|e| ObsError::IoError(format!("connect task failed: {}", e)))?
}

/// Connect, then create the schema and optionally seed the vocabulary.
async fn bootstrap_ingestor(
    config: &Config,
) -> Result<(Ingestor<StoreBackend>, SchemaReport), ObsError> {
    let opener = config.clone();
    tokio::task::spawn_blocking(move || {
        let mut ingestor = Ingestor::new(opener.open_backend()?, &opener.store.keyspace)?;
        let report = ingestor.bootstrap(opener.bootstrap.seed_vocabulary)?;
        Ok::<_, ObsError>((ingestor, report))
    })
    .await
    .map_err(|e| ObsError::IoError(format!("bootstrap task failed: {}", e)))?
}

/// Connect and make sure the schema exists.
async fn ready_ingestor(config: &Config) -> Result<Ingestor<StoreBackend>, ObsError> {
    let (ingestor, report) = bootstrap_ingestor(config).await?;
    if !report.is_complete() {
        tracing::warn!(failed = report.failed.len(), "schema bootstrap incomplete");
    }
    Ok(ingestor)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the schema and seed the vocabulary.
pub async fn cmd_init(config: &Config, json_mode: bool) -> Result<(), ObsError> {
    let (_, report) = bootstrap_ingestor(config).await?;

    if json_mode {
        print_json(&serde_json::json!({
            "keyspace": config.store.keyspace,
            "created": report.created,
            "existing": report.existing,
            "failed": report.failed,
            "vocabulary_seeded": config.bootstrap.seed_vocabulary,
        }));
    } else {
        println!("Keyspace: {}", config.store.keyspace);
        for object in &report.created {
            println!("  created  {}", object);
        }
        for object in &report.existing {
            println!("  exists   {}", object);
        }
        for (object, error) in &report.failed {
            println!("  FAILED   {} ({})", object, error);
        }
        if config.bootstrap.seed_vocabulary {
            println!("Vocabulary seeded.");
        }
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(ObsError::Store(format!(
            "{} schema object(s) could not be created",
            report.failed.len()
        )))
    }
}

// =============================================================================
// CONSUME COMMAND
// =============================================================================

/// Load newline-delimited JSON events from a file or stdin.
pub async fn cmd_consume(
    config: &Config,
    json_mode: bool,
    input: Option<&Path>,
) -> Result<(), ObsError> {
    let ingestor = shared::share(ready_ingestor(config).await?);

    let stats = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                ObsError::IoError(format!("Cannot open '{}': {}", path.display(), e))
            })?;
            let reader = tokio::io::BufReader::new(file);
            consumer::consume(reader, &ingestor, &config.consumer).await?
        }
        None => {
            let reader = tokio::io::BufReader::new(tokio::io::stdin());
            consumer::consume(reader, &ingestor, &config.consumer).await?
        }
    };

    print_stats(&stats, json_mode);
    Ok(())
}

fn print_stats(stats: &ConsumerStats, json_mode: bool) {
    if json_mode {
        print_json(&serde_json::json!(stats));
        return;
    }
    println!("Received:      {}", stats.received);
    println!("Written:       {}", stats.written);
    println!("Statements:    {}", stats.statements);
    println!("Skipped:       {}", stats.skipped);
    println!("Dropped:       {}", stats.dropped);
    println!("Dead-lettered: {}", stats.dead_lettered);
    println!("Retries:       {}", stats.retries);
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP ingest server.
pub async fn cmd_serve(config: &Config, host: &str, port: u16) -> Result<(), ObsError> {
    let ingestor = ready_ingestor(config).await?;

    println!("obsgraph HTTP ingest starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", config.store.backend.as_str());
    println!("  Keyspace: {}", config.store.keyspace);
    println!();
    println!("Endpoints:");
    println!("  POST /event  - Load an event");
    println!("  GET  /status - Row counts");
    println!("  GET  /health - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, ingestor).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show row counts per index table.
pub async fn cmd_status(config: &Config, json_mode: bool) -> Result<(), ObsError> {
    let ingestor = shared::share(open_ingestor(config).await?);
    let keyspace = config.store.keyspace.as_str();

    let counts = shared::with_ingestor(&ingestor, |ingestor| {
        let keyspace = ingestor.namespace().name().to_string();
        let mut counts = Vec::with_capacity(IndexTable::ALL.len());
        for table in IndexTable::ALL {
            let count = match ingestor.store().count_rows(&keyspace, table) {
                Ok(n) => Some(n),
                Err(ObsError::TableNotFound(_)) => None,
                Err(e) => return Err(e),
            };
            counts.push((table, count));
        }
        Ok(counts)
    })
    .await?;

    if json_mode {
        let tables: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(table, count)| (table.name().to_string(), serde_json::json!(count)))
            .collect();
        print_json(&serde_json::json!({
            "keyspace": keyspace,
            "backend": config.store.backend.as_str(),
            "tables": tables,
        }));
        return Ok(());
    }

    println!("obsgraph Store Status");
    println!("=====================");
    println!("Keyspace: {}", keyspace);
    println!("Backend:  {}", config.store.backend.as_str());
    println!();
    for (table, count) in counts {
        match count {
            Some(n) => println!("{:<4} {} rows", table.name(), n),
            None => println!("{:<4} missing (run `obsgraph init`)", table.name()),
        }
    }
    Ok(())
}

// =============================================================================
// MAP COMMAND
// =============================================================================

/// Print the statements each event maps to, one JSON object per line.
pub fn cmd_map(input: Option<&Path>) -> Result<(), ObsError> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|e| {
                ObsError::IoError(format!("Cannot open '{}': {}", path.display(), e))
            })?;
            Box::new(std::io::BufReader::new(file))
        }
        None => Box::new(std::io::stdin().lock()),
    };

    let mapper = StatementMapper::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ObsError::IoError(format!("read failed: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }
        match Event::from_json(line.as_bytes()) {
            Ok(event) => {
                for statement in mapper.map(&event) {
                    let json = serde_json::to_string(&statement)
                        .map_err(|e| ObsError::Serialization(e.to_string()))?;
                    println!("{}", json);
                }
            }
            Err(e) => tracing::warn!(line = n + 1, error = %e, "event skipped"),
        }
    }
    Ok(())
}
