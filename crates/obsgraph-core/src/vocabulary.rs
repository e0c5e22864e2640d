//! # Vocabulary
//!
//! Type and label statements for every class and property the mapper
//! emits, written once at bootstrap so that readers can render
//! human-readable names without a separate schema.

use crate::naming;
use crate::{Statement, Term};

/// Classes: (local name, label).
pub const CLASSES: &[(&str, &str)] = &[
    ("observation", "Observation"),
    ("device", "Device"),
    ("ip", "IP address"),
    ("tcp", "TCP port"),
    ("udp", "UDP port"),
];

/// Properties: (local name, label).
///
/// Header properties (`header:<name>`) are open-ended and not listed.
pub const PROPERTIES: &[(&str, &str)] = &[
    ("action", "Action"),
    ("device", "Device"),
    ("time", "Time"),
    ("url", "URL"),
    ("method", "Method"),
    ("status", "Status"),
    ("command", "Command"),
    ("text", "Text"),
    ("dnsType", "DNS message type"),
    ("query", "DNS Query"),
    ("answer_name", "Answer (name)"),
    ("answer_address", "Answer (address)"),
    ("from", "From"),
    ("to", "To"),
    ("src", "Source address"),
    ("dest", "Destination address"),
    ("context", "Context"),
    ("ip", "IP"),
    ("port", "Port"),
];

/// Statements describing the vocabulary, classes first.
#[must_use]
pub fn statements() -> Vec<Statement> {
    let rdf_type = naming::rdf_type();
    let rdfs_label = naming::rdfs_label();
    let resource = naming::rdf("Resource");
    let property = naming::rdf("Property");

    let mut out = Vec::with_capacity((CLASSES.len() + PROPERTIES.len()) * 2);
    for (name, label) in CLASSES {
        let id = naming::class(name);
        out.push(Statement::new(&id, &rdf_type, Term::identifier(&resource)));
        out.push(Statement::new(&id, &rdfs_label, Term::text(*label)));
    }
    for (name, label) in PROPERTIES {
        let id = naming::property(name);
        out.push(Statement::new(&id, &rdf_type, Term::identifier(&property)));
        out.push(Statement::new(&id, &rdfs_label, Term::text(*label)));
    }
    out
}
