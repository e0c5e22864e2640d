//! # redb-backed Statement Store
//!
//! A disk-backed store using the redb embedded database.
//!
//! Every namespace owns three redb tables named `<namespace>.<index>`, each
//! keyed by a 3-tuple of encoded columns with a unit value. Namespaces and
//! tables are recorded in two catalog tables so that an index table only
//! exists once it has been explicitly created; redb itself would create a
//! table silently on first write.
//!
//! A batch runs inside a single write transaction, so either every insert
//! commits or none does.

use super::{Batch, TripleStore, check_prefix, key_has_prefix};
use crate::schema::{IndexTable, NamespaceSpec};
use crate::{ObsError, Row};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Catalog: namespace name -> serialized `NamespaceSpec`
const NAMESPACES: TableDefinition<&str, &[u8]> = TableDefinition::new("system.namespaces");

/// Catalog: qualified table name -> serialized `TableSpec`
const TABLES: TableDefinition<&str, &[u8]> = TableDefinition::new("system.tables");

type IndexKey = (&'static str, &'static str, &'static str);

fn index_definition(qualified: &str) -> TableDefinition<'_, IndexKey, ()> {
    TableDefinition::new(qualified)
}

fn store_err(e: impl Display) -> ObsError {
    ObsError::Store(e.to_string())
}

/// A disk-backed statement store.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ObsError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(store_err)?;

        // Initialize catalog tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(store_err)?;
            let _ = write_txn.open_table(NAMESPACES).map_err(store_err)?;
            let _ = write_txn.open_table(TABLES).map_err(store_err)?;
            write_txn.commit().map_err(store_err)?;
        }

        tracing::debug!(path = %path.display(), "opened redb store");
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of every namespace in the catalog.
    pub fn namespaces(&self) -> Result<Vec<String>, ObsError> {
        let read_txn = self.db.begin_read().map_err(store_err)?;
        let table = read_txn.open_table(NAMESPACES).map_err(store_err)?;

        let mut names = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (_, value) = entry.map_err(store_err)?;
            let spec: NamespaceSpec = postcard::from_bytes(value.value())
                .map_err(|e| ObsError::Serialization(e.to_string()))?;
            names.push(spec.name().to_string());
        }
        Ok(names)
    }

    fn table_exists(&self, qualified: &str) -> Result<bool, ObsError> {
        let read_txn = self.db.begin_read().map_err(store_err)?;
        let tables = read_txn.open_table(TABLES).map_err(store_err)?;
        Ok(tables.get(qualified).map_err(store_err)?.is_some())
    }
}

// =============================================================================
// TRIPLESTORE TRAIT IMPLEMENTATION
// =============================================================================

impl TripleStore for RedbStore {
    fn create_namespace(&mut self, namespace: &NamespaceSpec) -> Result<(), ObsError> {
        let bytes =
            postcard::to_allocvec(namespace).map_err(|e| ObsError::Serialization(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(store_err)?;
        {
            let mut catalog = write_txn.open_table(NAMESPACES).map_err(store_err)?;
            if catalog.get(namespace.name()).map_err(store_err)?.is_some() {
                return Err(ObsError::AlreadyExists(namespace.name().to_string()));
            }
            catalog
                .insert(namespace.name(), bytes.as_slice())
                .map_err(store_err)?;
        }
        write_txn.commit().map_err(store_err)
    }

    fn create_table(&mut self, namespace: &str, table: IndexTable) -> Result<(), ObsError> {
        let qualified = table.qualified(namespace);
        let bytes = postcard::to_allocvec(&table.spec())
            .map_err(|e| ObsError::Serialization(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(store_err)?;
        {
            let namespaces = write_txn.open_table(NAMESPACES).map_err(store_err)?;
            if namespaces.get(namespace).map_err(store_err)?.is_none() {
                return Err(ObsError::NamespaceNotFound(namespace.to_string()));
            }

            let mut catalog = write_txn.open_table(TABLES).map_err(store_err)?;
            if catalog.get(qualified.as_str()).map_err(store_err)?.is_some() {
                return Err(ObsError::AlreadyExists(qualified));
            }
            catalog
                .insert(qualified.as_str(), bytes.as_slice())
                .map_err(store_err)?;

            let _ = write_txn
                .open_table(index_definition(&qualified))
                .map_err(store_err)?;
        }
        write_txn.commit().map_err(store_err)
    }

    fn execute_batch(&mut self, namespace: &str, batch: &Batch) -> Result<(), ObsError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut grouped: BTreeMap<IndexTable, Vec<&Row>> = BTreeMap::new();
        for insert in batch.iter() {
            grouped.entry(insert.table).or_default().push(&insert.row);
        }

        let write_txn = self.db.begin_write().map_err(store_err)?;
        {
            // Dropping the transaction on any early return aborts it.
            let catalog = write_txn.open_table(TABLES).map_err(store_err)?;
            for table in grouped.keys() {
                let qualified = table.qualified(namespace);
                if catalog.get(qualified.as_str()).map_err(store_err)?.is_none() {
                    return Err(ObsError::TableNotFound(qualified));
                }
            }
            drop(catalog);

            for (table, rows) in &grouped {
                let qualified = table.qualified(namespace);
                let mut index = write_txn
                    .open_table(index_definition(&qualified))
                    .map_err(store_err)?;
                for row in rows {
                    index.insert(table.key(row), ()).map_err(store_err)?;
                }
            }
        }
        write_txn.commit().map_err(store_err)
    }

    fn count_rows(&self, namespace: &str, table: IndexTable) -> Result<u64, ObsError> {
        let qualified = table.qualified(namespace);
        if !self.table_exists(&qualified)? {
            return Err(ObsError::TableNotFound(qualified));
        }

        let read_txn = self.db.begin_read().map_err(store_err)?;
        let index = read_txn
            .open_table(index_definition(&qualified))
            .map_err(store_err)?;
        index.len().map_err(store_err)
    }

    fn scan(
        &self,
        namespace: &str,
        table: IndexTable,
        prefix: &[&str],
    ) -> Result<Vec<Row>, ObsError> {
        check_prefix(prefix)?;
        let qualified = table.qualified(namespace);
        if !self.table_exists(&qualified)? {
            return Err(ObsError::TableNotFound(qualified));
        }

        let read_txn = self.db.begin_read().map_err(store_err)?;
        let index = read_txn
            .open_table(index_definition(&qualified))
            .map_err(store_err)?;

        let lower = (
            prefix.first().copied().unwrap_or_default(),
            prefix.get(1).copied().unwrap_or_default(),
            prefix.get(2).copied().unwrap_or_default(),
        );

        let mut rows = Vec::new();
        for entry in index.range(lower..).map_err(store_err)? {
            let (key, _) = entry.map_err(store_err)?;
            let key = key.value();
            if !key_has_prefix(key, prefix) {
                break;
            }
            rows.push(table.row_from_key(key));
        }
        Ok(rows)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_ready(dir: &TempDir) -> RedbStore {
        let mut store = RedbStore::open(dir.path().join("obs.redb")).expect("open");
        store
            .create_namespace(&NamespaceSpec::new("rdf").expect("ns"))
            .expect("namespace");
        for table in IndexTable::ALL {
            store.create_table("rdf", table).expect("table");
        }
        store
    }

    #[test]
    fn catalog_survives_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("obs.redb");

        {
            let _ = open_ready(&dir);
        }

        let mut store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.namespaces().expect("namespaces"), vec!["rdf"]);
        assert!(matches!(
            store.create_table("rdf", IndexTable::Spo),
            Err(ObsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_table_requires_namespace() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = RedbStore::open(dir.path().join("obs.redb")).expect("open");
        assert!(matches!(
            store.create_table("rdf", IndexTable::Osp),
            Err(ObsError::NamespaceNotFound(_))
        ));
    }

    #[test]
    fn missing_table_is_not_created_implicitly() {
        let dir = TempDir::new().expect("tempdir");
        let store = RedbStore::open(dir.path().join("obs.redb")).expect("open");
        assert!(matches!(
            store.count_rows("rdf", IndexTable::Spo),
            Err(ObsError::TableNotFound(_))
        ));
    }

    #[test]
    fn failed_batch_commits_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = RedbStore::open(dir.path().join("obs.redb")).expect("open");
        store
            .create_namespace(&NamespaceSpec::new("rdf").expect("ns"))
            .expect("namespace");
        store.create_table("rdf", IndexTable::Spo).expect("spo");

        let row = Row::new("u:a", "u:b", "s:c");
        let mut batch = Batch::new();
        batch.insert(IndexTable::Spo, row.clone());
        batch.insert(IndexTable::Osp, row);

        assert!(matches!(
            store.execute_batch("rdf", &batch),
            Err(ObsError::TableNotFound(_))
        ));
        assert_eq!(store.count_rows("rdf", IndexTable::Spo).expect("count"), 0);
    }

    #[test]
    fn batch_rows_persist_and_scan_in_order() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("obs.redb");
        {
            let mut store = open_ready(&dir);
            let mut batch = Batch::new();
            for row in [
                Row::new("u:b", "u:p", "s:1"),
                Row::new("u:a", "u:p", "s:2"),
                Row::new("u:a", "u:q", "s:1"),
            ] {
                for table in IndexTable::ALL {
                    batch.insert(table, row.clone());
                }
            }
            store.execute_batch("rdf", &batch).expect("write");
            // Same rows again overwrite in place.
            store.execute_batch("rdf", &batch).expect("rewrite");
        }

        let store = RedbStore::open(&path).expect("reopen");
        for table in IndexTable::ALL {
            assert_eq!(store.count_rows("rdf", table).expect("count"), 3);
        }

        let by_subject = store.scan("rdf", IndexTable::Spo, &["u:a"]).expect("scan");
        assert_eq!(
            by_subject,
            vec![Row::new("u:a", "u:p", "s:2"), Row::new("u:a", "u:q", "s:1")]
        );

        let by_object = store.scan("rdf", IndexTable::Osp, &["s:1"]).expect("scan");
        assert_eq!(
            by_object,
            vec![Row::new("u:a", "u:q", "s:1"), Row::new("u:b", "u:p", "s:1")]
        );
    }
}
