//! # Line Consumer
//!
//! Reads newline-delimited JSON events and loads each one.
//!
//! Acknowledgement policy per message:
//!
//! - malformed JSON or a missing required field: dropped, counted
//! - lifecycle event: acknowledged without a write
//! - write failure: retried, then dead-lettered if a dead-letter file is
//!   configured, otherwise the consumer stops and returns the error

use crate::config::ConsumerConfig;
use crate::shared::{SharedIngestor, with_ingestor};
use obsgraph_core::{Event, ObsError, Outcome, TripleStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};

/// Counters for one consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerStats {
    /// Non-blank lines read.
    pub received: u64,
    /// Events written.
    pub written: u64,
    /// Statements written across all events.
    pub statements: u64,
    /// Lifecycle events acknowledged without a write.
    pub skipped: u64,
    /// Lines that failed to decode.
    pub dropped: u64,
    /// Lines appended to the dead-letter file.
    pub dead_lettered: u64,
    /// Write attempts beyond the first.
    pub retries: u64,
}

/// Consume every line from `reader` until end of input.
///
/// Each write runs on the blocking pool through [`with_ingestor`].
pub async fn consume<R, S>(
    reader: R,
    ingestor: &SharedIngestor<S>,
    policy: &ConsumerConfig,
) -> Result<ConsumerStats, ObsError>
where
    R: AsyncBufRead + Unpin,
    S: TripleStore + Send + 'static,
{
    let mut stats = ConsumerStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ObsError::IoError(format!("read failed: {e}")))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.received += 1;

        let event = match Event::from_json(line.as_bytes()) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = stats.received, error = %e, "message dropped");
                stats.dropped += 1;
                continue;
            }
        };

        match load_with_retries(ingestor, &event, policy, &mut stats).await {
            Ok(Outcome::Written { statements }) => {
                stats.written += 1;
                stats.statements += statements as u64;
            }
            Ok(Outcome::Skipped { .. }) => stats.skipped += 1,
            Err(e) => match &policy.dead_letter {
                Some(path) => {
                    dead_letter(path, line).await?;
                    tracing::error!(id = %event.id, error = %e, path = %path.display(), "event dead-lettered");
                    stats.dead_lettered += 1;
                }
                None => {
                    tracing::error!(id = %event.id, error = %e, "write failed, stopping consumer");
                    return Err(e);
                }
            },
        }
    }

    tracing::info!(
        received = stats.received,
        written = stats.written,
        statements = stats.statements,
        skipped = stats.skipped,
        dropped = stats.dropped,
        dead_lettered = stats.dead_lettered,
        "consumer finished"
    );
    Ok(stats)
}

async fn load_with_retries<S: TripleStore + Send + 'static>(
    ingestor: &SharedIngestor<S>,
    event: &Event,
    policy: &ConsumerConfig,
    stats: &mut ConsumerStats,
) -> Result<Outcome, ObsError> {
    let mut attempt = 0u32;
    loop {
        let job = event.clone();
        match with_ingestor(ingestor, move |ingestor| ingestor.handle(&job)).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) if attempt < policy.write_retries => {
                attempt += 1;
                stats.retries += 1;
                tracing::warn!(id = %event.id, attempt, error = %e, "write failed, retrying");
                tokio::time::sleep(policy.retry_delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn dead_letter(path: &Path, line: &str) -> Result<(), ObsError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| ObsError::IoError(format!("Cannot open '{}': {}", path.display(), e)))?;
    file.write_all(format!("{line}\n").as_bytes())
        .await
        .map_err(|e| ObsError::IoError(format!("Cannot write '{}': {}", path.display(), e)))
}
