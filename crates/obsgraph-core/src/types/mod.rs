//! # Core Type Definitions
//!
//! This module contains the value types shared by every obsgraph component:
//! - Statement representation (`Term`, `Statement`)
//! - Stored row representation (`Row`) and its column encoding
//! - Error types (`ObsError`)
//!
//! ## Column Encoding
//!
//! Every stored column carries a one-character tag and a colon so that a
//! reader can tell an identifier from a literal without a schema lookup:
//!
//! | tag  | meaning           |
//! |------|-------------------|
//! | `u:` | identifier (URI)  |
//! | `s:` | text literal      |
//! | `d:` | datetime literal  |
//!
//! Subjects and predicates are always identifiers.

use crate::primitives::{DATETIME_TAG, IDENTIFIER_TAG, TEXT_TAG};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// TERMS
// =============================================================================

/// The object position of a statement.
///
/// The variant is the literal-type tag; it survives storage as the column
/// prefix (see [`Term::encode`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Term {
    /// An identifier-valued object.
    Identifier(String),
    /// A plain text literal.
    Text(String),
    /// A datetime literal, kept in the lexical form the event carried.
    DateTime(String),
}

impl Term {
    /// Create an identifier term.
    #[must_use]
    pub fn identifier(s: impl Into<String>) -> Self {
        Self::Identifier(s.into())
    }

    /// Create a text literal term.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create a datetime literal term.
    #[must_use]
    pub fn datetime(s: impl Into<String>) -> Self {
        Self::DateTime(s.into())
    }

    /// The untagged lexical value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Identifier(s) | Self::Text(s) | Self::DateTime(s) => s,
        }
    }

    /// The column tag for this term kind.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Identifier(_) => IDENTIFIER_TAG,
            Self::Text(_) => TEXT_TAG,
            Self::DateTime(_) => DATETIME_TAG,
        }
    }

    /// Encode as a tagged column value, e.g. `s:GET`.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(self.tag().len() + self.as_str().len());
        out.push_str(self.tag());
        out.push_str(self.as_str());
        out
    }

    /// Decode a tagged column value.
    ///
    /// Returns `ObsError::Decode` if the value carries none of the three tags.
    pub fn decode(column: &str) -> Result<Self, ObsError> {
        if let Some(rest) = column.strip_prefix(IDENTIFIER_TAG) {
            Ok(Self::identifier(rest))
        } else if let Some(rest) = column.strip_prefix(TEXT_TAG) {
            Ok(Self::text(rest))
        } else if let Some(rest) = column.strip_prefix(DATETIME_TAG) {
            Ok(Self::datetime(rest))
        } else {
            Err(ObsError::Decode(format!("untagged column value: {column}")))
        }
    }

    /// Check if this term is identifier-valued.
    #[must_use]
    pub const fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }
}

// =============================================================================
// STATEMENT
// =============================================================================

/// A single `(subject, predicate, object)` fact.
///
/// Subject and predicate are always identifiers; only the object is tagged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// Subject identifier.
    pub subject: String,
    /// Predicate identifier.
    pub predicate: String,
    /// Object term.
    pub object: Term,
}

impl Statement {
    /// Create a new statement.
    #[must_use]
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }

    /// Encode into the stored column form.
    #[must_use]
    pub fn to_row(&self) -> Row {
        Row {
            s: format!("{IDENTIFIER_TAG}{}", self.subject),
            p: format!("{IDENTIFIER_TAG}{}", self.predicate),
            o: self.object.encode(),
        }
    }

    /// Decode a stored row back into a statement.
    pub fn from_row(row: &Row) -> Result<Self, ObsError> {
        let subject = match Term::decode(&row.s)? {
            Term::Identifier(s) => s,
            other => {
                return Err(ObsError::Decode(format!(
                    "subject must be an identifier, got {}",
                    other.encode()
                )));
            }
        };
        let predicate = match Term::decode(&row.p)? {
            Term::Identifier(p) => p,
            other => {
                return Err(ObsError::Decode(format!(
                    "predicate must be an identifier, got {}",
                    other.encode()
                )));
            }
        };
        Ok(Self {
            subject,
            predicate,
            object: Term::decode(&row.o)?,
        })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            Term::Identifier(o) => write!(f, "<{}> <{}> <{}>", self.subject, self.predicate, o),
            Term::Text(o) => write!(f, "<{}> <{}> {:?}", self.subject, self.predicate, o),
            Term::DateTime(o) => {
                write!(f, "<{}> <{}> {:?}^^dateTime", self.subject, self.predicate, o)
            }
        }
    }
}

// =============================================================================
// ROW
// =============================================================================

/// The three encoded text columns of one stored statement.
///
/// Column names follow the table schema: `s`, `p`, `o`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Row {
    /// Encoded subject column.
    pub s: String,
    /// Encoded predicate column.
    pub p: String,
    /// Encoded object column.
    pub o: String,
}

impl Row {
    /// Create a row from already-encoded columns.
    #[must_use]
    pub fn new(s: impl Into<String>, p: impl Into<String>, o: impl Into<String>) -> Self {
        Self {
            s: s.into(),
            p: p.into(),
            o: o.into(),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in obsgraph.
///
/// - Write-path failures are returned to the caller, never swallowed
/// - The CORE should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum ObsError {
    /// The input could not be decoded into an event or a stored value.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The backing store rejected an operation.
    #[error("Store error: {0}")]
    Store(String),

    /// The namespace has not been created.
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// The table has not been created.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A namespace or table with this name already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The connector gave up after exhausting its retry policy.
    #[error("Could not connect after {attempts} attempt(s): {last_error}")]
    ConnectFailed {
        /// Number of attempts made.
        attempts: u32,
        /// Error reported by the final attempt.
        last_error: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl ObsError {
    /// Check if this error reports that a schema object already exists.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
