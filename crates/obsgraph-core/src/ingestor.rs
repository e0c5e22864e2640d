//! # Ingestor Module
//!
//! The per-event load protocol:
//!
//! - Decode the message (malformed input is rejected, never written)
//! - Skip connection lifecycle events
//! - Map the event to statements
//! - Write them to all three index tables as one batch
//!
//! Write failures are returned to the caller, which decides whether to
//! retry, dead-letter or stop.

use crate::event::Event;
use crate::mapper::StatementMapper;
use crate::schema::{NamespaceSpec, SchemaReport, ensure_schema};
use crate::storage::TripleStore;
use crate::vocabulary;
use crate::writer::BatchWriter;
use crate::ObsError;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Statements were written.
    Written { statements: usize },
    /// The event was acknowledged without a write.
    Skipped { action: String },
}

/// Loads events into a statement store.
#[derive(Debug)]
pub struct Ingestor<S: TripleStore> {
    store: S,
    namespace: NamespaceSpec,
    mapper: StatementMapper,
}

impl<S: TripleStore> Ingestor<S> {
    /// Create an ingestor writing into `namespace`.
    ///
    /// Returns `ObsError::Config` if the namespace name is invalid.
    pub fn new(store: S, namespace: &str) -> Result<Self, ObsError> {
        Ok(Self {
            store,
            namespace: NamespaceSpec::new(namespace)?,
            mapper: StatementMapper::new(),
        })
    }

    /// Ensure the schema exists and optionally seed the vocabulary.
    ///
    /// Schema creation errors are recorded in the report, not returned. A
    /// failed vocabulary write is returned.
    pub fn bootstrap(&mut self, seed_vocabulary: bool) -> Result<SchemaReport, ObsError> {
        let report = ensure_schema(&mut self.store, &self.namespace);

        if seed_vocabulary {
            let statements = vocabulary::statements();
            BatchWriter::write(&mut self.store, self.namespace.name(), &statements)?;
            tracing::info!(statements = statements.len(), "vocabulary seeded");
        }

        Ok(report)
    }

    /// Load one decoded event.
    pub fn handle(&mut self, event: &Event) -> Result<Outcome, ObsError> {
        if event.action.is_lifecycle() {
            tracing::debug!(id = %event.id, action = event.action.name(), "lifecycle event skipped");
            return Ok(Outcome::Skipped {
                action: event.action.name().to_string(),
            });
        }

        let statements = self.mapper.map(event);
        let written = BatchWriter::write(&mut self.store, self.namespace.name(), &statements)?;
        tracing::debug!(id = %event.id, action = event.action.name(), statements = written, "event loaded");
        Ok(Outcome::Written {
            statements: written,
        })
    }

    /// Decode and load one raw message.
    ///
    /// Returns `ObsError::Decode` for malformed input; nothing is written.
    pub fn handle_message(&mut self, payload: &[u8]) -> Result<Outcome, ObsError> {
        let event = Event::from_json(payload).inspect_err(|e| {
            tracing::warn!(error = %e, bytes = payload.len(), "message dropped");
        })?;
        self.handle(&event)
    }

    /// The statement mapper.
    #[must_use]
    pub fn mapper(&self) -> &StatementMapper {
        &self.mapper
    }

    /// The target namespace.
    #[must_use]
    pub fn namespace(&self) -> &NamespaceSpec {
        &self.namespace
    }

    /// Borrow the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Borrow the store mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the ingestor, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }
}
