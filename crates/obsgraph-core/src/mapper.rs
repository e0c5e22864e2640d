//! # Statement Mapper
//!
//! Turns one decoded [`Event`] into the ordered statements that describe it.
//!
//! Every event yields, in order:
//! 1. the observation's `rdf:type` (a text literal)
//! 2. its action name
//! 3. its device relation, plus the device's type and label
//! 4. its timestamp
//! 5. its URL, if it has one
//!
//! followed by the action-specific statements and finally the statements
//! for the source and destination address lists.
//!
//! Mapping is a pure function of the event: the same event always yields a
//! byte-identical statement sequence.

use crate::event::{
    Action, AddressClass, AddressDescriptor, DnsMessage, Event, HttpRequest, HttpResponse,
    ProtocolCommand, ProtocolResponse, SmtpData,
};
use crate::naming::{self, EntityKind};
use crate::{Statement, Term};

// =============================================================================
// STATEMENT BUFFER
// =============================================================================

/// Accumulates statements about one event with precomputed predicates.
struct Statements {
    out: Vec<Statement>,
    rdf_type: String,
    rdfs_label: String,
}

impl Statements {
    fn new() -> Self {
        Self {
            out: Vec::with_capacity(32),
            rdf_type: naming::rdf_type(),
            rdfs_label: naming::rdfs_label(),
        }
    }

    fn identifier(&mut self, s: &str, p: &str, o: impl Into<String>) {
        self.out.push(Statement::new(s, p, Term::identifier(o)));
    }

    fn text(&mut self, s: &str, p: &str, o: impl Into<String>) {
        self.out.push(Statement::new(s, p, Term::text(o)));
    }

    fn datetime(&mut self, s: &str, p: &str, o: impl Into<String>) {
        self.out.push(Statement::new(s, p, Term::datetime(o)));
    }

    fn typed(&mut self, s: &str, class: &str) {
        self.out.push(Statement::new(
            s,
            self.rdf_type.as_str(),
            Term::identifier(naming::class(class)),
        ));
    }

    /// Type statement whose class is a text literal.
    fn typed_literal(&mut self, s: &str, class: &str) {
        self.out.push(Statement::new(
            s,
            self.rdf_type.as_str(),
            Term::text(naming::class(class)),
        ));
    }

    fn label(&mut self, s: &str, label: impl Into<String>) {
        self.out
            .push(Statement::new(s, self.rdfs_label.as_str(), Term::text(label)));
    }

    fn property_text(&mut self, s: &str, property: &str, o: impl Into<String>) {
        self.text(s, &naming::property(property), o);
    }

    fn into_vec(self) -> Vec<Statement> {
        self.out
    }
}

// =============================================================================
// ADDRESS FOLD
// =============================================================================

/// Which address list is being folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Source,
    Destination,
}

impl Direction {
    /// Property linking the observation to an endpoint on this side.
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::Source => "src",
            Self::Destination => "dest",
        }
    }
}

/// Running state of one address-list fold: the most recent IPv4 address.
///
/// A fresh context is created for every list, so the source and destination
/// folds never observe each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressContext {
    ip: String,
}

impl AddressContext {
    /// The owning address for subsequent transport entries.
    #[must_use]
    pub fn ip(&self) -> &str {
        &self.ip
    }
}

fn fold_addresses(
    buf: &mut Statements,
    observation: &str,
    direction: Direction,
    descriptors: &[String],
) -> AddressContext {
    descriptors
        .iter()
        .map(|raw| AddressDescriptor::parse(raw))
        .fold(AddressContext::default(), |context, descriptor| {
            address_step(buf, observation, direction, context, descriptor)
        })
}

fn address_step(
    buf: &mut Statements,
    observation: &str,
    direction: Direction,
    context: AddressContext,
    descriptor: AddressDescriptor,
) -> AddressContext {
    match descriptor.class {
        AddressClass::Ipv4 => {
            let ip = naming::object(EntityKind::Ip, &descriptor.value);
            buf.typed(&ip, "ip");
            buf.label(&ip, descriptor.value.as_str());
            buf.property_text(&ip, "ip", descriptor.value.as_str());
            AddressContext {
                ip: descriptor.value,
            }
        }
        AddressClass::Tcp => {
            endpoint(buf, observation, direction, &context, EntityKind::Tcp, &descriptor.value);
            context
        }
        AddressClass::Udp => {
            endpoint(buf, observation, direction, &context, EntityKind::Udp, &descriptor.value);
            context
        }
        AddressClass::Other(_) => context,
    }
}

fn endpoint(
    buf: &mut Statements,
    observation: &str,
    direction: Direction,
    context: &AddressContext,
    kind: EntityKind,
    port: &str,
) {
    if context.ip.is_empty() {
        // Kept as `:port`; there is no agreed meaning for a hostless endpoint.
        tracing::debug!(
            observation,
            port,
            protocol = kind.segment(),
            "transport descriptor without preceding ipv4 descriptor"
        );
    }

    let key = format!("{}:{}", context.ip, port);
    let id = naming::object(kind, &key);

    buf.identifier(observation, &naming::property(direction.property()), id.as_str());
    buf.typed(&id, kind.segment());
    buf.label(&id, format!("{} {key}", kind.label()));
    buf.identifier(
        &id,
        &naming::property("context"),
        naming::object(EntityKind::Ip, &context.ip),
    );
    buf.property_text(&id, "ip", context.ip.as_str());
    buf.property_text(&id, "port", port);
}

// =============================================================================
// ACTION-SPECIFIC STATEMENTS
// =============================================================================

fn http_request(buf: &mut Statements, obs: &str, url: &str, req: &HttpRequest) {
    buf.label(obs, format!("HTTP {} {}", req.method, url));
    buf.property_text(obs, "method", req.method.as_str());
    headers(buf, obs, req.header.iter());
}

fn http_response(buf: &mut Statements, obs: &str, url: &str, resp: &HttpResponse) {
    buf.label(obs, format!("HTTP {} {} {}", resp.code, resp.status, url));
    buf.property_text(obs, "status", resp.status.as_str());
    headers(buf, obs, resp.header.iter());
}

fn headers<'a>(
    buf: &mut Statements,
    obs: &str,
    header: impl Iterator<Item = (&'a String, &'a String)>,
) {
    for (key, value) in header {
        buf.property_text(obs, &format!("header:{key}"), value.as_str());
    }
}

fn dns_message(buf: &mut Statements, obs: &str, msg: &DnsMessage) {
    let mut label = format!("DNS {}", msg.kind_label());
    for record in &msg.query {
        label.push(' ');
        label.push_str(&record.name);
    }
    buf.label(obs, label);
    buf.property_text(obs, "dnsType", msg.kind.as_str());

    for record in &msg.query {
        buf.property_text(obs, "query", record.name.as_str());
    }
    for record in &msg.answer {
        if !record.name.is_empty() {
            buf.property_text(obs, "answer_name", record.name.as_str());
        }
        if !record.address.is_empty() {
            buf.property_text(obs, "answer_address", record.address.as_str());
        }
    }
}

fn command(buf: &mut Statements, obs: &str, protocol: &str, cmd: &ProtocolCommand) {
    buf.label(obs, format!("{protocol} {}", cmd.command));
    buf.property_text(obs, "command", cmd.command.as_str());
}

fn response(buf: &mut Statements, obs: &str, protocol: &str, resp: &ProtocolResponse) {
    buf.label(obs, format!("{protocol} {}", resp.status));
    buf.property_text(obs, "status", resp.status.to_string());
    if !resp.text.is_empty() {
        buf.property_text(obs, "text", resp.text.join(" "));
    }
}

fn smtp_data(buf: &mut Statements, obs: &str, data: &SmtpData) {
    let mut label = format!("SMTP {}", data.from);
    for to in &data.to {
        label.push(' ');
        label.push_str(to);
    }
    buf.label(obs, label);

    if !data.from.is_empty() {
        buf.property_text(obs, "from", data.from.as_str());
    }
    for to in &data.to {
        buf.property_text(obs, "to", to.as_str());
    }
}

// =============================================================================
// MAPPER
// =============================================================================

/// The StatementMapper turns events into statements.
///
/// It is stateless; all state of the address fold lives in the
/// [`AddressContext`] threaded through each list.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementMapper;

impl StatementMapper {
    /// Create a mapper.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Map one event to its ordered statements. Never fails.
    #[must_use]
    pub fn map(&self, event: &Event) -> Vec<Statement> {
        let mut buf = Statements::new();
        let obs = naming::object(EntityKind::Observation, &event.id);

        buf.typed_literal(&obs, "observation");
        buf.property_text(&obs, "action", event.action.name());

        let device = naming::object(EntityKind::Device, &event.device);
        buf.identifier(&obs, &naming::property("device"), device.as_str());
        buf.typed(&device, "device");
        buf.label(&device, format!("Device {}", event.device));

        buf.datetime(&obs, &naming::property("time"), event.time.as_str());

        if !event.url.is_empty() {
            buf.identifier(&obs, &naming::property("url"), event.url.as_str());
        }

        match &event.action {
            Action::UnrecognisedDatagram => buf.label(&obs, "unrecognised datagram"),
            Action::UnrecognisedStream => buf.label(&obs, "unrecognised stream"),
            Action::Icmp => buf.label(&obs, "ICMP"),
            Action::HttpRequest(req) => http_request(&mut buf, &obs, &event.url, req),
            Action::HttpResponse(resp) => http_response(&mut buf, &obs, &event.url, resp),
            Action::DnsMessage(msg) => dns_message(&mut buf, &obs, msg),
            Action::FtpCommand(cmd) => command(&mut buf, &obs, "FTP", cmd),
            Action::FtpResponse(resp) => response(&mut buf, &obs, "FTP", resp),
            Action::SmtpCommand(cmd) => command(&mut buf, &obs, "SMTP", cmd),
            Action::SmtpResponse(resp) => response(&mut buf, &obs, "SMTP", resp),
            Action::SmtpData(data) => smtp_data(&mut buf, &obs, data),
            Action::ConnectedUp | Action::ConnectedDown | Action::Unknown(_) => {}
        }

        fold_addresses(&mut buf, &obs, Direction::Source, &event.src);
        fold_addresses(&mut buf, &obs, Direction::Destination, &event.dest);

        buf.into_vec()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DnsRecord;
    use std::collections::BTreeMap;

    const OBS: &str = "http://cyberprobe.sf.net/obj/obs/ev1";

    fn event(action: Action) -> Event {
        Event::new("ev1", "dev1", "2017-04-24T12:34:24.341Z", action)
    }

    fn texts(stmts: &[Statement], property: &str) -> Vec<String> {
        let p = naming::property(property);
        stmts
            .iter()
            .filter(|s| s.predicate == p)
            .map(|s| s.object.as_str().to_string())
            .collect()
    }

    fn label_of(stmts: &[Statement], subject: &str) -> Option<String> {
        let p = naming::rdfs_label();
        stmts
            .iter()
            .find(|s| s.subject == subject && s.predicate == p)
            .map(|s| s.object.as_str().to_string())
    }

    #[test]
    fn always_emitted_prefix() {
        let stmts = StatementMapper::new().map(&event(Action::Icmp).with_url("http://x/"));

        assert_eq!(
            stmts[0],
            Statement::new(OBS, naming::rdf_type(), Term::text(naming::class("observation")))
        );
        assert_eq!(
            stmts[1],
            Statement::new(OBS, naming::property("action"), Term::text("icmp"))
        );
        let device = naming::object(EntityKind::Device, "dev1");
        assert_eq!(
            stmts[2],
            Statement::new(OBS, naming::property("device"), Term::identifier(&device))
        );
        assert_eq!(
            stmts[3],
            Statement::new(&device, naming::rdf_type(), Term::identifier(naming::class("device")))
        );
        assert_eq!(
            stmts[4],
            Statement::new(&device, naming::rdfs_label(), Term::text("Device dev1"))
        );
        assert_eq!(
            stmts[5],
            Statement::new(
                OBS,
                naming::property("time"),
                Term::datetime("2017-04-24T12:34:24.341Z")
            )
        );
        assert_eq!(
            stmts[6],
            Statement::new(OBS, naming::property("url"), Term::identifier("http://x/"))
        );
        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("ICMP"));
        assert_eq!(stmts.len(), 8);
    }

    #[test]
    fn url_omitted_when_empty() {
        let stmts = StatementMapper::new().map(&event(Action::UnrecognisedStream));
        assert!(texts(&stmts, "url").is_empty());
        assert_eq!(stmts.len(), 7);
        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("unrecognised stream"));
    }

    #[test]
    fn unknown_action_has_no_extras() {
        let stmts = StatementMapper::new().map(&event(Action::Unknown("gopher".into())));
        // type, action, device relation + device type/label, time
        assert_eq!(stmts.len(), 6);
        assert_eq!(texts(&stmts, "action"), vec!["gopher"]);
        assert!(label_of(&stmts, OBS).is_none());
    }

    #[test]
    fn http_response_statements() {
        let resp = HttpResponse {
            code: 404,
            status: "Not Found".into(),
            header: BTreeMap::from([
                ("Server".to_string(), "nginx".to_string()),
                ("Content-Type".to_string(), "text/html".to_string()),
            ]),
        };
        let stmts = StatementMapper::new()
            .map(&event(Action::HttpResponse(resp)).with_url("http://x/missing"));

        assert_eq!(
            label_of(&stmts, OBS).as_deref(),
            Some("HTTP 404 Not Found http://x/missing")
        );
        assert_eq!(texts(&stmts, "status"), vec!["Not Found"]);

        // Header statements follow key order.
        let tail: Vec<_> = stmts[stmts.len() - 2..]
            .iter()
            .map(|s| s.predicate.clone())
            .collect();
        assert_eq!(
            tail,
            vec![
                naming::property("header:Content-Type"),
                naming::property("header:Server")
            ]
        );
    }

    #[test]
    fn dns_query_statements() {
        let msg = DnsMessage {
            kind: "query".into(),
            query: vec![
                DnsRecord {
                    name: "a.example".into(),
                    address: String::new(),
                },
                DnsRecord {
                    name: "b.example".into(),
                    address: String::new(),
                },
            ],
            answer: Vec::new(),
        };
        let stmts = StatementMapper::new().map(&event(Action::DnsMessage(msg)));

        assert_eq!(
            label_of(&stmts, OBS).as_deref(),
            Some("DNS query a.example b.example")
        );
        assert_eq!(texts(&stmts, "dnsType"), vec!["query"]);
        assert_eq!(texts(&stmts, "query"), vec!["a.example", "b.example"]);
    }

    #[test]
    fn dns_answer_skips_empty_fields() {
        let msg = DnsMessage {
            kind: "response".into(),
            query: vec![DnsRecord {
                name: "a.example".into(),
                address: String::new(),
            }],
            answer: vec![
                DnsRecord {
                    name: "a.example".into(),
                    address: "192.0.2.1".into(),
                },
                DnsRecord {
                    name: String::new(),
                    address: "192.0.2.2".into(),
                },
                DnsRecord {
                    name: "cname.example".into(),
                    address: String::new(),
                },
            ],
        };
        let stmts = StatementMapper::new().map(&event(Action::DnsMessage(msg)));

        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("DNS answer a.example"));
        assert_eq!(texts(&stmts, "dnsType"), vec!["response"]);
        assert_eq!(texts(&stmts, "answer_name"), vec!["a.example", "cname.example"]);
        assert_eq!(texts(&stmts, "answer_address"), vec!["192.0.2.1", "192.0.2.2"]);
    }

    #[test]
    fn ftp_command_and_response() {
        let mapper = StatementMapper::new();

        let stmts = mapper.map(&event(Action::FtpCommand(ProtocolCommand {
            command: "RETR file.txt".into(),
        })));
        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("FTP RETR file.txt"));
        assert_eq!(texts(&stmts, "command"), vec!["RETR file.txt"]);

        let stmts = mapper.map(&event(Action::FtpResponse(ProtocolResponse {
            status: 220,
            text: vec!["Welcome".into(), "to".into(), "FTP".into()],
        })));
        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("FTP 220"));
        assert_eq!(texts(&stmts, "status"), vec!["220"]);
        assert_eq!(texts(&stmts, "text"), vec!["Welcome to FTP"]);
    }

    #[test]
    fn smtp_response_uses_its_own_text() {
        let stmts = StatementMapper::new().map(&event(Action::SmtpResponse(ProtocolResponse {
            status: 250,
            text: vec!["a".into(), "b".into()],
        })));
        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("SMTP 250"));
        assert_eq!(texts(&stmts, "text"), vec!["a b"]);
    }

    #[test]
    fn smtp_response_with_text_from_json() {
        let json = br#"{"action":"smtp_response","id":"ev1","device":"dev1","time":"t",
            "ftp_response":{"status":220,"text":["wrong"]},
            "smtp_response":{"status":250,"text":["a","b"]}}"#;
        let stmts = StatementMapper::new().map(&Event::from_json(json).expect("decode"));
        assert_eq!(texts(&stmts, "text"), vec!["a b"]);
        assert_eq!(texts(&stmts, "status"), vec!["250"]);
    }

    #[test]
    fn smtp_response_without_text() {
        let stmts = StatementMapper::new().map(&event(Action::SmtpResponse(ProtocolResponse {
            status: 250,
            text: Vec::new(),
        })));
        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("SMTP 250"));
        assert_eq!(texts(&stmts, "status"), vec!["250"]);
        assert!(texts(&stmts, "text").is_empty());
    }

    #[test]
    fn smtp_command_label() {
        let stmts = StatementMapper::new().map(&event(Action::SmtpCommand(ProtocolCommand {
            command: "HELO mail.example".into(),
        })));
        assert_eq!(label_of(&stmts, OBS).as_deref(), Some("SMTP HELO mail.example"));
    }

    #[test]
    fn smtp_data_statements() {
        let data = SmtpData {
            from: "a@example.com".into(),
            to: vec!["b@example.com".into(), "c@example.com".into()],
        };
        let stmts = StatementMapper::new().map(&event(Action::SmtpData(data)));

        assert_eq!(
            label_of(&stmts, OBS).as_deref(),
            Some("SMTP a@example.com b@example.com c@example.com")
        );
        assert_eq!(texts(&stmts, "from"), vec!["a@example.com"]);
        assert_eq!(texts(&stmts, "to"), vec!["b@example.com", "c@example.com"]);
    }

    #[test]
    fn smtp_data_without_sender() {
        let data = SmtpData {
            from: String::new(),
            to: vec!["b@example.com".into()],
        };
        let stmts = StatementMapper::new().map(&event(Action::SmtpData(data)));
        assert!(texts(&stmts, "from").is_empty());
        assert_eq!(texts(&stmts, "to"), vec!["b@example.com"]);
    }

    #[test]
    fn ipv4_descriptor_statements() {
        let stmts = StatementMapper::new().map(&event(Action::Icmp).with_src(["ipv4:10.0.0.1"]));
        let ip = naming::object(EntityKind::Ip, "10.0.0.1");

        let about_ip: Vec<_> = stmts.iter().filter(|s| s.subject == ip).collect();
        assert_eq!(about_ip.len(), 3);
        assert_eq!(about_ip[0].object, Term::identifier(naming::class("ip")));
        assert_eq!(about_ip[1].object, Term::text("10.0.0.1"));
        assert_eq!(about_ip[2].predicate, naming::property("ip"));
    }

    #[test]
    fn transport_descriptor_statements() {
        let stmts = StatementMapper::new()
            .map(&event(Action::Icmp).with_dest(["ipv4:192.0.2.7", "udp:53"]));
        let endpoint = naming::object(EntityKind::Udp, "192.0.2.7:53");

        assert!(stmts.contains(&Statement::new(
            OBS,
            naming::property("dest"),
            Term::identifier(&endpoint)
        )));
        assert!(texts(&stmts, "src").is_empty());

        let about: Vec<_> = stmts.iter().filter(|s| s.subject == endpoint).collect();
        assert_eq!(about.len(), 5);
        assert_eq!(about[0].object, Term::identifier(naming::class("udp")));
        assert_eq!(about[1].object, Term::text("UDP 192.0.2.7:53"));
        assert_eq!(
            about[2].object,
            Term::identifier(naming::object(EntityKind::Ip, "192.0.2.7"))
        );
        assert_eq!(about[3].object, Term::text("192.0.2.7"));
        assert_eq!(about[4].object, Term::text("53"));
    }

    #[test]
    fn tcp_endpoint_type_and_label() {
        let stmts = StatementMapper::new()
            .map(&event(Action::Icmp).with_src(["ipv4:10.0.0.1", "tcp:443"]));
        let endpoint = naming::object(EntityKind::Tcp, "10.0.0.1:443");

        assert!(stmts.contains(&Statement::new(
            &endpoint,
            naming::rdf_type(),
            Term::identifier(naming::class("tcp"))
        )));
        assert_eq!(label_of(&stmts, &endpoint).as_deref(), Some("TCP 10.0.0.1:443"));
    }

    #[test]
    fn context_is_latest_ipv4() {
        let stmts = StatementMapper::new().map(&event(Action::Icmp).with_src([
            "ipv4:10.0.0.1",
            "ipv4:10.0.0.2",
            "tcp:22",
        ]));
        let endpoint = naming::object(EntityKind::Tcp, "10.0.0.2:22");
        assert!(stmts.iter().any(|s| s.subject == endpoint));
    }

    #[test]
    fn source_context_does_not_leak_into_destination() {
        let stmts = StatementMapper::new().map(
            &event(Action::Icmp)
                .with_src(["ipv4:10.0.0.1", "tcp:1234"])
                .with_dest(["tcp:80"]),
        );
        let dest = naming::object(EntityKind::Tcp, ":80");
        assert!(stmts.contains(&Statement::new(
            OBS,
            naming::property("dest"),
            Term::identifier(&dest)
        )));
    }

    #[test]
    fn unknown_descriptor_classes_are_ignored() {
        let stmts = StatementMapper::new()
            .map(&event(Action::Icmp).with_src(["ipv6:fe80::1", "eth:aa:bb", "junk"]));
        assert_eq!(stmts.len(), 7);
    }

    #[test]
    fn malformed_transport_descriptor_has_empty_port() {
        let stmts =
            StatementMapper::new().map(&event(Action::Icmp).with_src(["ipv4:10.0.0.1", "tcp"]));
        let endpoint = naming::object(EntityKind::Tcp, "10.0.0.1:");
        let port = naming::property("port");
        assert!(stmts.contains(&Statement::new(&endpoint, port, Term::text(""))));
    }

    #[test]
    fn fold_returns_final_context() {
        let mut buf = Statements::new();
        let context = fold_addresses(
            &mut buf,
            OBS,
            Direction::Source,
            &["ipv4:10.0.0.1".to_string(), "tcp:80".to_string()],
        );
        assert_eq!(context.ip(), "10.0.0.1");
        assert_eq!(buf.into_vec().len(), 3 + 6);
    }
}
