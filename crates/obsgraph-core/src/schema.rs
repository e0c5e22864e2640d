//! # Schema
//!
//! The tri-index layout and the bootstrapper that creates it.
//!
//! Every statement is stored three times, once per key ordering:
//!
//! | table | key order   | answers lookups by |
//! |-------|-------------|--------------------|
//! | `spo` | (s, p, o)   | subject, subject+predicate |
//! | `pos` | (p, o, s)   | predicate, predicate+object |
//! | `osp` | (o, s, p)   | object, object+subject |
//!
//! Creation is idempotent: the bootstrapper attempts every creation on every
//! start and treats "already exists" as the expected steady state.

use crate::primitives::NAMESPACE_SEPARATOR;
use crate::storage::TripleStore;
use crate::{ObsError, Row};
use serde::{Deserialize, Serialize};

// =============================================================================
// COLUMNS & INDEX TABLES
// =============================================================================

/// A statement column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    S,
    P,
    O,
}

/// One of the three index orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexTable {
    Spo,
    Pos,
    Osp,
}

impl IndexTable {
    /// All index tables, in write order.
    pub const ALL: [Self; 3] = [Self::Spo, Self::Pos, Self::Osp];

    /// Unqualified table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spo => "spo",
            Self::Pos => "pos",
            Self::Osp => "osp",
        }
    }

    /// Primary-key column order. The first two form the lookup prefix.
    #[must_use]
    pub const fn key_columns(self) -> [Column; 3] {
        match self {
            Self::Spo => [Column::S, Column::P, Column::O],
            Self::Pos => [Column::P, Column::O, Column::S],
            Self::Osp => [Column::O, Column::S, Column::P],
        }
    }

    /// Project a row into this table's key order.
    #[must_use]
    pub fn key(self, row: &Row) -> (&str, &str, &str) {
        match self {
            Self::Spo => (&row.s, &row.p, &row.o),
            Self::Pos => (&row.p, &row.o, &row.s),
            Self::Osp => (&row.o, &row.s, &row.p),
        }
    }

    /// Rebuild a row from a key in this table's order.
    #[must_use]
    pub fn row_from_key(self, key: (&str, &str, &str)) -> Row {
        let (a, b, c) = key;
        match self {
            Self::Spo => Row::new(a, b, c),
            Self::Pos => Row::new(c, a, b),
            Self::Osp => Row::new(b, c, a),
        }
    }

    /// `namespace.table`
    #[must_use]
    pub fn qualified(self, namespace: &str) -> String {
        format!("{namespace}{NAMESPACE_SEPARATOR}{}", self.name())
    }

    /// The catalog entry describing this table.
    #[must_use]
    pub fn spec(self) -> TableSpec {
        TableSpec {
            table: self,
            key: self.key_columns(),
        }
    }
}

// =============================================================================
// CATALOG ENTRIES
// =============================================================================

/// A namespace that holds one set of index tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSpec {
    name: String,
}

impl NamespaceSpec {
    /// Validate and create a namespace spec.
    ///
    /// Names follow unquoted identifier rules: a leading ASCII letter, then
    /// ASCII letters, digits or underscores, at most 48 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, ObsError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_start || !valid_rest || name.len() > 48 {
            return Err(ObsError::Config(format!("invalid namespace name: {name:?}")));
        }
        Ok(Self { name })
    }

    /// The namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Catalog entry for a created table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Which ordering the table holds.
    pub table: IndexTable,
    /// Primary-key column order.
    pub key: [Column; 3],
}

// =============================================================================
// BOOTSTRAPPER
// =============================================================================

/// What a schema bootstrap did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Objects created by this run.
    pub created: Vec<String>,
    /// Objects that already existed.
    pub existing: Vec<String>,
    /// Objects whose creation failed for another reason, with the error.
    pub failed: Vec<(String, String)>,
}

impl SchemaReport {
    fn record(&mut self, object: String, result: Result<(), ObsError>) {
        match result {
            Ok(()) => {
                tracing::info!(object = %object, "created");
                self.created.push(object);
            }
            Err(e) if e.is_already_exists() => {
                tracing::debug!(object = %object, "already exists (ignored)");
                self.existing.push(object);
            }
            Err(e) => {
                tracing::warn!(object = %object, error = %e, "create error (ignored)");
                self.failed.push((object, e.to_string()));
            }
        }
    }

    /// True if every object is now present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ensure the namespace and its three index tables exist.
///
/// Never fails: every creation error is logged and recorded in the report.
pub fn ensure_schema<S: TripleStore + ?Sized>(
    store: &mut S,
    namespace: &NamespaceSpec,
) -> SchemaReport {
    let mut report = SchemaReport::default();

    tracing::info!(namespace = namespace.name(), "ensuring schema");
    report.record(namespace.name().to_string(), store.create_namespace(namespace));

    for table in IndexTable::ALL {
        report.record(
            table.qualified(namespace.name()),
            store.create_table(namespace.name(), table),
        );
    }

    report
}

// =============================================================================
// TESTS
// =============================================================================
