//! In-memory statement tables.

use super::{Batch, TripleStore, check_prefix, key_has_prefix};
use crate::schema::{IndexTable, NamespaceSpec};
use crate::{ObsError, Row};
use std::collections::{BTreeMap, BTreeSet};

type Key = (String, String, String);

/// Volatile store keeping every table as an ordered key set.
///
/// Uses `BTreeMap`/`BTreeSet` exclusively so scans come back in key order,
/// matching the redb backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    namespaces: BTreeMap<String, NamespaceSpec>,
    /// Qualified table name -> keys in table order.
    tables: BTreeMap<String, BTreeSet<Key>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, namespace: &str, table: IndexTable) -> Result<&BTreeSet<Key>, ObsError> {
        let qualified = table.qualified(namespace);
        self.tables
            .get(&qualified)
            .ok_or(ObsError::TableNotFound(qualified))
    }
}

impl TripleStore for MemoryStore {
    fn create_namespace(&mut self, namespace: &NamespaceSpec) -> Result<(), ObsError> {
        if self.namespaces.contains_key(namespace.name()) {
            return Err(ObsError::AlreadyExists(namespace.name().to_string()));
        }
        self.namespaces
            .insert(namespace.name().to_string(), namespace.clone());
        Ok(())
    }

    fn create_table(&mut self, namespace: &str, table: IndexTable) -> Result<(), ObsError> {
        if !self.namespaces.contains_key(namespace) {
            return Err(ObsError::NamespaceNotFound(namespace.to_string()));
        }
        let qualified = table.qualified(namespace);
        if self.tables.contains_key(&qualified) {
            return Err(ObsError::AlreadyExists(qualified));
        }
        self.tables.insert(qualified, BTreeSet::new());
        Ok(())
    }

    fn execute_batch(&mut self, namespace: &str, batch: &Batch) -> Result<(), ObsError> {
        // Resolve every target first so a missing table leaves nothing applied.
        for insert in batch.iter() {
            self.table(namespace, insert.table)?;
        }

        for insert in batch.iter() {
            let (a, b, c) = insert.table.key(&insert.row);
            let key = (a.to_string(), b.to_string(), c.to_string());
            if let Some(rows) = self.tables.get_mut(&insert.table.qualified(namespace)) {
                rows.insert(key);
            }
        }
        Ok(())
    }

    fn count_rows(&self, namespace: &str, table: IndexTable) -> Result<u64, ObsError> {
        Ok(self.table(namespace, table)?.len() as u64)
    }

    fn scan(
        &self,
        namespace: &str,
        table: IndexTable,
        prefix: &[&str],
    ) -> Result<Vec<Row>, ObsError> {
        check_prefix(prefix)?;
        let rows = self.table(namespace, table)?;

        let lower: Key = (
            prefix.first().copied().unwrap_or_default().to_string(),
            prefix.get(1).copied().unwrap_or_default().to_string(),
            prefix.get(2).copied().unwrap_or_default().to_string(),
        );

        Ok(rows
            .range(lower..)
            .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
            .take_while(|key| key_has_prefix(*key, prefix))
            .map(|key| table.row_from_key(key))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .create_namespace(&NamespaceSpec::new("rdf").expect("ns"))
            .expect("namespace");
        for table in IndexTable::ALL {
            store.create_table("rdf", table).expect("table");
        }
        store
    }

    #[test]
    fn create_table_requires_namespace() {
        let mut store = MemoryStore::new();
        let result = store.create_table("rdf", IndexTable::Spo);
        assert!(matches!(result, Err(ObsError::NamespaceNotFound(_))));
    }

    #[test]
    fn duplicate_creation_is_reported() {
        let mut store = ready_store();
        let ns = NamespaceSpec::new("rdf").expect("ns");
        assert!(matches!(
            store.create_namespace(&ns),
            Err(ObsError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.create_table("rdf", IndexTable::Pos),
            Err(ObsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn batch_to_missing_table_applies_nothing() {
        let mut store = MemoryStore::new();
        store
            .create_namespace(&NamespaceSpec::new("rdf").expect("ns"))
            .expect("namespace");
        store.create_table("rdf", IndexTable::Spo).expect("table");

        let mut batch = Batch::new();
        batch.insert(IndexTable::Spo, Row::new("u:a", "u:b", "s:c"));
        batch.insert(IndexTable::Pos, Row::new("u:a", "u:b", "s:c"));

        let result = store.execute_batch("rdf", &batch);
        assert!(matches!(result, Err(ObsError::TableNotFound(_))));
        assert_eq!(store.count_rows("rdf", IndexTable::Spo).expect("count"), 0);
    }

    #[test]
    fn reinsert_overwrites() {
        let mut store = ready_store();
        let mut batch = Batch::new();
        batch.insert(IndexTable::Spo, Row::new("u:a", "u:b", "s:c"));
        store.execute_batch("rdf", &batch).expect("first");
        store.execute_batch("rdf", &batch).expect("second");
        assert_eq!(store.count_rows("rdf", IndexTable::Spo).expect("count"), 1);
    }

    #[test]
    fn scan_by_prefix_in_table_order() {
        let mut store = ready_store();
        let mut batch = Batch::new();
        for row in [
            Row::new("u:a", "u:p", "s:1"),
            Row::new("u:a", "u:q", "s:2"),
            Row::new("u:b", "u:p", "s:1"),
        ] {
            batch.insert(IndexTable::Spo, row.clone());
            batch.insert(IndexTable::Pos, row);
        }
        store.execute_batch("rdf", &batch).expect("write");

        let by_subject = store.scan("rdf", IndexTable::Spo, &["u:a"]).expect("scan");
        assert_eq!(by_subject.len(), 2);

        let by_po = store
            .scan("rdf", IndexTable::Pos, &["u:p", "s:1"])
            .expect("scan");
        assert_eq!(
            by_po,
            vec![Row::new("u:a", "u:p", "s:1"), Row::new("u:b", "u:p", "s:1")]
        );

        let all = store.scan("rdf", IndexTable::Spo, &[]).expect("scan");
        assert_eq!(all.len(), 3);
    }
}
