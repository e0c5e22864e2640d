//! # Storage
//!
//! The `TripleStore` trait and its two backends:
//! - `MemoryStore`: in-memory `BTreeSet` tables (fast, volatile)
//! - `RedbStore`: disk-backed tables in a redb database (ACID, persistent)
//!
//! Stores deal in encoded [`Row`]s, not statements: the column tags are
//! applied by the writer before anything reaches a backend.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::schema::{IndexTable, NamespaceSpec};
use crate::{ObsError, Row};

// =============================================================================
// BATCH
// =============================================================================

/// One row destined for one index table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    /// Target table.
    pub table: IndexTable,
    /// Encoded row.
    pub row: Row,
}

/// A group of inserts applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    inserts: Vec<Insert>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty batch with room for `n` inserts.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            inserts: Vec::with_capacity(n),
        }
    }

    /// Queue an insert.
    pub fn insert(&mut self, table: IndexTable, row: Row) {
        self.inserts.push(Insert { table, row });
    }

    /// Number of queued inserts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inserts.len()
    }

    /// Check if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }

    /// Queued inserts in order.
    pub fn iter(&self) -> impl Iterator<Item = &Insert> {
        self.inserts.iter()
    }
}

// =============================================================================
// TRIPLESTORE TRAIT
// =============================================================================

/// The operations the loader needs from a statement store.
///
/// Inserting a row whose key already exists overwrites it, so re-writing
/// the same statements never duplicates rows.
pub trait TripleStore {
    /// Create a namespace.
    ///
    /// Returns `ObsError::AlreadyExists` if it exists.
    fn create_namespace(&mut self, namespace: &NamespaceSpec) -> Result<(), ObsError>;

    /// Create an index table inside an existing namespace.
    ///
    /// Returns `ObsError::NamespaceNotFound` if the namespace is missing and
    /// `ObsError::AlreadyExists` if the table exists.
    fn create_table(&mut self, namespace: &str, table: IndexTable) -> Result<(), ObsError>;

    /// Apply every insert in the batch, or none of them.
    fn execute_batch(&mut self, namespace: &str, batch: &Batch) -> Result<(), ObsError>;

    /// Number of rows in a table.
    fn count_rows(&self, namespace: &str, table: IndexTable) -> Result<u64, ObsError>;

    /// Rows whose key starts with `prefix`, in key order.
    ///
    /// `prefix` holds at most three encoded column values in the table's own
    /// key order; an empty prefix returns the whole table.
    fn scan(&self, namespace: &str, table: IndexTable, prefix: &[&str])
    -> Result<Vec<Row>, ObsError>;
}

/// Check a scan prefix length.
pub(crate) fn check_prefix(prefix: &[&str]) -> Result<(), ObsError> {
    if prefix.len() > 3 {
        return Err(ObsError::Config(format!(
            "scan prefix has {} components, at most 3 allowed",
            prefix.len()
        )));
    }
    Ok(())
}

/// Check if a key in table order starts with `prefix`.
pub(crate) fn key_has_prefix(key: (&str, &str, &str), prefix: &[&str]) -> bool {
    let parts = [key.0, key.1, key.2];
    prefix.iter().zip(parts).all(|(want, have)| *want == have)
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// A store chosen at runtime.
#[derive(Debug)]
pub enum StoreBackend {
    /// In-memory tables (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed tables using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StoreBackend {
    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl TripleStore for StoreBackend {
    fn create_namespace(&mut self, namespace: &NamespaceSpec) -> Result<(), ObsError> {
        match self {
            Self::InMemory(s) => s.create_namespace(namespace),
            Self::Persistent(s) => s.create_namespace(namespace),
        }
    }

    fn create_table(&mut self, namespace: &str, table: IndexTable) -> Result<(), ObsError> {
        match self {
            Self::InMemory(s) => s.create_table(namespace, table),
            Self::Persistent(s) => s.create_table(namespace, table),
        }
    }

    fn execute_batch(&mut self, namespace: &str, batch: &Batch) -> Result<(), ObsError> {
        match self {
            Self::InMemory(s) => s.execute_batch(namespace, batch),
            Self::Persistent(s) => s.execute_batch(namespace, batch),
        }
    }

    fn count_rows(&self, namespace: &str, table: IndexTable) -> Result<u64, ObsError> {
        match self {
            Self::InMemory(s) => s.count_rows(namespace, table),
            Self::Persistent(s) => s.count_rows(namespace, table),
        }
    }

    fn scan(
        &self,
        namespace: &str,
        table: IndexTable,
        prefix: &[&str],
    ) -> Result<Vec<Row>, ObsError> {
        match self {
            Self::InMemory(s) => s.scan(namespace, table, prefix),
            Self::Persistent(s) => s.scan(namespace, table, prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching() {
        assert!(key_has_prefix(("a", "b", "c"), &[]));
        assert!(key_has_prefix(("a", "b", "c"), &["a"]));
        assert!(key_has_prefix(("a", "b", "c"), &["a", "b"]));
        assert!(!key_has_prefix(("a", "b", "c"), &["a", "x"]));
        assert!(!key_has_prefix(("ab", "b", "c"), &["a"]));
    }

    #[test]
    fn prefix_length_is_bounded() {
        assert!(check_prefix(&["a", "b", "c"]).is_ok());
        assert!(check_prefix(&["a", "b", "c", "d"]).is_err());
    }

    #[test]
    fn batch_collects_inserts() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        batch.insert(IndexTable::Spo, Row::new("a", "b", "c"));
        batch.insert(IndexTable::Pos, Row::new("a", "b", "c"));
        assert_eq!(batch.len(), 2);
        let tables: Vec<_> = batch.iter().map(|i| i.table).collect();
        assert_eq!(tables, vec![IndexTable::Spo, IndexTable::Pos]);
    }

    #[test]
    fn default_backend_is_in_memory() {
        assert!(!StoreBackend::default().is_persistent());
    }
}
