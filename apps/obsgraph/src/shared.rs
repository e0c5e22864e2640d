//! # Shared Ingestor
//!
//! Async access to an ingestor whose store calls are synchronous.
//!
//! redb transactions block on disk I/O, so every store call made from async
//! code runs on tokio's blocking pool while the caller holds the ingestor
//! lock. Writes stay serialized.

use obsgraph_core::{Ingestor, ObsError, TripleStore};
use std::sync::Arc;
use tokio::sync::Mutex;

/// An ingestor shared between async tasks.
pub type SharedIngestor<S> = Arc<Mutex<Ingestor<S>>>;

/// Wrap an ingestor for shared use.
#[must_use]
pub fn share<S: TripleStore>(ingestor: Ingestor<S>) -> SharedIngestor<S> {
    Arc::new(Mutex::new(ingestor))
}

/// Run `job` against the ingestor on the blocking pool.
///
/// Returns `ObsError::IoError` if the blocking task panicked or was
/// cancelled.
pub async fn with_ingestor<S, T, F>(shared: &SharedIngestor<S>, job: F) -> Result<T, ObsError>
where
    S: TripleStore + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut Ingestor<S>) -> Result<T, ObsError> + Send + 'static,
{
    let mut guard = Arc::clone(shared).lock_owned().await;
    tokio::task::spawn_blocking(move || job(&mut *guard))
        .await
        .map_err(|e| ObsError::IoError(format!("store task failed: {e}")))?
}
