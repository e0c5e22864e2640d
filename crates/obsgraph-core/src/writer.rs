//! # Writer
//!
//! Turns an event's statements into one batch that lands the same rows in
//! all three index tables.

use crate::schema::IndexTable;
use crate::storage::{Batch, TripleStore};
use crate::{ObsError, Statement};

/// Builds and executes tri-index batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchWriter;

impl BatchWriter {
    /// Build the batch for `statements`: three inserts per statement, in
    /// `spo`, `pos`, `osp` order.
    #[must_use]
    pub fn batch(statements: &[Statement]) -> Batch {
        let mut batch = Batch::with_capacity(statements.len() * IndexTable::ALL.len());
        for statement in statements {
            let row = statement.to_row();
            for table in IndexTable::ALL {
                batch.insert(table, row.clone());
            }
        }
        batch
    }

    /// Write `statements` to `namespace` as a single atomic batch.
    ///
    /// Returns the number of statements written. An empty slice writes
    /// nothing and succeeds.
    pub fn write<S: TripleStore + ?Sized>(
        store: &mut S,
        namespace: &str,
        statements: &[Statement],
    ) -> Result<usize, ObsError> {
        if statements.is_empty() {
            return Ok(0);
        }

        let batch = Self::batch(statements);
        store.execute_batch(namespace, &batch).inspect_err(|e| {
            tracing::error!(
                namespace,
                statements = statements.len(),
                error = %e,
                "batch write failed"
            );
        })?;

        tracing::trace!(namespace, statements = statements.len(), "batch written");
        Ok(statements.len())
    }
}
