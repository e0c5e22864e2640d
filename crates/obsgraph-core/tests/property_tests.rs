//! # Property-Based Tests
//!
//! Determinism and tri-index consistency over generated events.

use obsgraph_core::naming::{self, EntityKind};
use obsgraph_core::{
    Action, BatchWriter, Event, IndexTable, MemoryStore, NamespaceSpec, Statement,
    StatementMapper, Term, TripleStore, ensure_schema,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// STRATEGIES
// =============================================================================

fn descriptor() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..=255, 0u8..=255).prop_map(|(a, b)| format!("ipv4:10.0.{a}.{b}")),
        (1u16..).prop_map(|p| format!("tcp:{p}")),
        (1u16..).prop_map(|p| format!("udp:{p}")),
        "[a-z]{1,6}:[a-z0-9]{0,6}",
    ]
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Icmp),
        Just(Action::UnrecognisedStream),
        "[A-Z]{3,7}".prop_map(|method| {
            Action::HttpRequest(obsgraph_core::event::HttpRequest {
                method,
                ..Default::default()
            })
        }),
        "[a-z_]{1,12}".prop_map(Action::Unknown),
    ]
}

fn event() -> impl Strategy<Value = Event> {
    (
        "[a-z0-9-]{1,16}",
        "[a-z0-9]{1,8}",
        action(),
        vec(descriptor(), 0..6),
        vec(descriptor(), 0..6),
    )
        .prop_map(|(id, device, action, src, dest)| {
            Event::new(id, device, "2017-04-24T12:34:24.341Z", action)
                .with_src(src)
                .with_dest(dest)
        })
}

fn fresh_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    let report = ensure_schema(&mut store, &NamespaceSpec::new("rdf").expect("ns"));
    assert!(report.is_complete());
    store
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Same event produces identical statement sequences.
    #[test]
    fn mapping_is_deterministic(event in event()) {
        let mapper = StatementMapper::new();
        prop_assert_eq!(mapper.map(&event), mapper.map(&event));
    }

    /// The four fixed observation statements appear exactly once each.
    #[test]
    fn fixed_statements_appear_once(event in event()) {
        let obs = naming::object(EntityKind::Observation, &event.id);
        let stmts = StatementMapper::new().map(&event);

        for predicate in [
            naming::rdf_type(),
            naming::property("action"),
            naming::property("device"),
            naming::property("time"),
        ] {
            let n = stmts
                .iter()
                .filter(|s| s.subject == obs && s.predicate == predicate)
                .count();
            prop_assert_eq!(n, 1);
        }
    }

    /// After a write each index table holds exactly the distinct statements.
    #[test]
    fn index_tables_agree(event in event()) {
        let stmts = StatementMapper::new().map(&event);
        let distinct: BTreeSet<Statement> = stmts.iter().cloned().collect();

        let mut store = fresh_store();
        BatchWriter::write(&mut store, "rdf", &stmts).expect("write");

        for table in IndexTable::ALL {
            let got: BTreeSet<Statement> = store
                .scan("rdf", table, &[])
                .expect("scan")
                .iter()
                .map(|r| Statement::from_row(r).expect("decode"))
                .collect();
            prop_assert_eq!(&got, &distinct);
        }
    }

    /// Writing twice leaves the same rows.
    #[test]
    fn rewrite_is_idempotent(event in event()) {
        let stmts = StatementMapper::new().map(&event);
        let mut store = fresh_store();

        BatchWriter::write(&mut store, "rdf", &stmts).expect("write");
        let once = store.scan("rdf", IndexTable::Spo, &[]).expect("scan");
        BatchWriter::write(&mut store, "rdf", &stmts).expect("rewrite");
        let twice = store.scan("rdf", IndexTable::Spo, &[]).expect("scan");

        prop_assert_eq!(once, twice);
    }

    /// Column encoding is reversible for every term kind.
    #[test]
    fn term_encoding_reverses(value in ".{0,40}", kind in 0u8..3) {
        let term = match kind {
            0 => Term::identifier(value),
            1 => Term::text(value),
            _ => Term::datetime(value),
        };
        prop_assert_eq!(Term::decode(&term.encode()).expect("decode"), term);
    }

    /// Every transport endpoint is keyed by the most recent ipv4 before it.
    #[test]
    fn endpoint_key_uses_latest_ipv4(src in vec(descriptor(), 0..8)) {
        let event = Event::new("e", "d", "t", Action::Icmp).with_src(src.clone());
        let stmts = StatementMapper::new().map(&event);
        let obs = naming::object(EntityKind::Observation, "e");
        let src_prop = naming::property("src");

        let mut ip = String::new();
        let mut expected = Vec::new();
        for raw in &src {
            match raw.split_once(':') {
                Some(("ipv4", v)) => ip = v.to_string(),
                Some(("tcp", port)) => {
                    expected.push(naming::object(EntityKind::Tcp, &format!("{ip}:{port}")));
                }
                Some(("udp", port)) => {
                    expected.push(naming::object(EntityKind::Udp, &format!("{ip}:{port}")));
                }
                _ => {}
            }
        }

        let linked: Vec<String> = stmts
            .iter()
            .filter(|s| s.subject == obs && s.predicate == src_prop)
            .map(|s| s.object.as_str().to_string())
            .collect();
        prop_assert_eq!(linked, expected);
    }
}
