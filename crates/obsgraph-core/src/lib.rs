//! # obsgraph-core
//!
//! The loader for obsgraph - THE WRITE PATH.
//!
//! This crate turns decoded network-observation events into RDF-style
//! statements and persists every statement in three index tables, one per
//! key ordering (`spo`, `pos`, `osp`), so that any two known terms of a
//! statement can be looked up by prefix.
//!
//! ## Pipeline
//!
//! ```text
//! bytes --Event::from_json--> Event --StatementMapper--> [Statement]
//!       --BatchWriter--> Batch --TripleStore::execute_batch--> spo/pos/osp
//! ```
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Identifiers are pure functions of event fields; mapping never fails
//! - One event is one atomic batch across the three index tables
//! - Store failures are returned to the caller, never swallowed

// =============================================================================
// MODULES
// =============================================================================

pub mod connector;
pub mod event;
pub mod ingestor;
pub mod mapper;
pub mod naming;
pub mod primitives;
pub mod schema;
pub mod storage;
pub mod types;
pub mod vocabulary;
pub mod writer;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ObsError, Row, Statement, Term};

// =============================================================================
// RE-EXPORTS: Loader
// =============================================================================

pub use connector::{Backoff, Connector, RetryPolicy, parse_contact_points};
pub use event::{Action, AddressClass, AddressDescriptor, Event};
pub use ingestor::{Ingestor, Outcome};
pub use mapper::{AddressContext, Direction, StatementMapper};
pub use schema::{IndexTable, NamespaceSpec, SchemaReport, ensure_schema};
pub use storage::{Batch, MemoryStore, RedbStore, StoreBackend, TripleStore};
pub use writer::BatchWriter;
