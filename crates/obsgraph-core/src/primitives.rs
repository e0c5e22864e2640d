//! # Loader Primitives
//!
//! Hardcoded runtime constants for the obsgraph CORE.
//!
//! These are compiled into the binary and are immutable at runtime. The
//! namespace URIs and column tags are part of the stored data format:
//! changing any of them makes previously written rows unreadable by name.

// =============================================================================
// IDENTIFIER NAMESPACES
// =============================================================================

/// Prefix for entity identifiers (observations, devices, endpoints).
pub const OBJECT_NS: &str = "http://cyberprobe.sf.net/obj/";

/// Prefix for property identifiers.
pub const PROPERTY_NS: &str = "http://cyberprobe.sf.net/prop/";

/// Prefix for type identifiers.
pub const TYPE_NS: &str = "http://cyberprobe.sf.net/type/";

/// RDF syntax namespace.
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// RDF schema namespace.
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

// =============================================================================
// COLUMN TAGS
// =============================================================================

/// Tag for identifier-valued columns.
pub const IDENTIFIER_TAG: &str = "u:";

/// Tag for text-literal columns.
pub const TEXT_TAG: &str = "s:";

/// Tag for datetime-literal columns.
pub const DATETIME_TAG: &str = "d:";

// =============================================================================
// STORE DEFAULTS
// =============================================================================

/// Namespace the index tables live in unless configured otherwise.
pub const DEFAULT_KEYSPACE: &str = "rdf";

/// Delay between connection attempts.
pub const DEFAULT_CONNECT_DELAY_SECS: u64 = 5;

/// Connection attempts before the connector gives up.
///
/// At the default delay this waits one minute for the store to appear.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 12;

/// Separator between namespace and table in qualified table names.
pub const NAMESPACE_SEPARATOR: char = '.';

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum size of one encoded event accepted by the ingestor (1 MiB).
///
/// Larger payloads are rejected as decode errors before JSON parsing.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;
