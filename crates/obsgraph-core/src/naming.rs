//! # Entity Naming
//!
//! Canonical identifiers for observations, devices, endpoints, properties
//! and types.
//!
//! All functions are pure string concatenation. Local keys are not escaped,
//! so a key containing `/` produces an identifier that cannot be split back
//! into kind and key unambiguously. Event ids, device names and `ip:port`
//! keys never contain `/` in practice.

use crate::primitives::{OBJECT_NS, PROPERTY_NS, RDF_NS, RDFS_NS, TYPE_NS};

/// The entity families that receive object identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    /// One observed event.
    Observation,
    /// The probe that reported the event.
    Device,
    /// An IPv4 address.
    Ip,
    /// A TCP endpoint (`address:port`).
    Tcp,
    /// A UDP endpoint (`address:port`).
    Udp,
}

impl EntityKind {
    /// The identifier segment for this kind.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Observation => "obs",
            Self::Device => "device",
            Self::Ip => "ip",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }

    /// Label prefix for entities of this kind, e.g. `TCP 10.0.0.1:80`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Observation => "Observation",
            Self::Device => "Device",
            Self::Ip => "IP",
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

/// `OBJECT_NS + kind + "/" + key`
#[must_use]
pub fn object(kind: EntityKind, key: &str) -> String {
    let segment = kind.segment();
    let mut out = String::with_capacity(OBJECT_NS.len() + segment.len() + 1 + key.len());
    out.push_str(OBJECT_NS);
    out.push_str(segment);
    out.push('/');
    out.push_str(key);
    out
}

/// `PROPERTY_NS + name`
#[must_use]
pub fn property(name: &str) -> String {
    format!("{PROPERTY_NS}{name}")
}

/// `TYPE_NS + name`
#[must_use]
pub fn class(name: &str) -> String {
    format!("{TYPE_NS}{name}")
}

/// `rdf:type`
#[must_use]
pub fn rdf_type() -> String {
    format!("{RDF_NS}type")
}

/// `rdfs:label`
#[must_use]
pub fn rdfs_label() -> String {
    format!("{RDFS_NS}label")
}

/// A term in the RDF syntax namespace, e.g. `rdf:Property`.
#[must_use]
pub fn rdf(local: &str) -> String {
    format!("{RDF_NS}{local}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_identifiers() {
        assert_eq!(
            object(EntityKind::Observation, "ev1"),
            "http://cyberprobe.sf.net/obj/obs/ev1"
        );
        assert_eq!(
            object(EntityKind::Tcp, "1.2.3.4:80"),
            "http://cyberprobe.sf.net/obj/tcp/1.2.3.4:80"
        );
        assert_eq!(
            object(EntityKind::Device, "dev1"),
            "http://cyberprobe.sf.net/obj/device/dev1"
        );
    }

    #[test]
    fn property_and_class_identifiers() {
        assert_eq!(property("header:Host"), "http://cyberprobe.sf.net/prop/header:Host");
        assert_eq!(class("observation"), "http://cyberprobe.sf.net/type/observation");
    }

    #[test]
    fn rdf_vocabulary() {
        assert_eq!(rdf_type(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
        assert_eq!(rdfs_label(), "http://www.w3.org/2000/01/rdf-schema#label");
        assert_eq!(rdf("Property"), "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property");
    }

    #[test]
    fn kind_labels() {
        assert_eq!(EntityKind::Tcp.label(), "TCP");
        assert_eq!(EntityKind::Udp.label(), "UDP");
        assert_eq!(EntityKind::Ip.label(), "IP");
        assert_eq!(EntityKind::Device.label(), "Device");
    }

    #[test]
    fn empty_key_is_kept() {
        assert_eq!(object(EntityKind::Ip, ""), "http://cyberprobe.sf.net/obj/ip/");
    }

    #[test]
    fn naming_is_deterministic() {
        assert_eq!(
            object(EntityKind::Udp, "10.0.0.1:53"),
            object(EntityKind::Udp, "10.0.0.1:53")
        );
    }
}
