//! # Event Model
//!
//! Typed network-observation events as delivered by the probe pipeline.
//!
//! The wire format is one JSON object per event. The `action` field selects
//! which nested payload object is meaningful; a payload object that is
//! absent decodes as its empty default. Decoding turns the loosely-typed
//! wire object into the closed [`Action`] enum so the mapper can match on it
//! exhaustively.

use crate::ObsError;
use crate::primitives::MAX_EVENT_BYTES;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Decode `null` as the type's default, the way a missing key decodes.
///
/// Producers that serialize empty lists and maps as `null` are common.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// `http_request` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRequest {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Request headers, iterated in key order.
    #[serde(default, deserialize_with = "null_default")]
    pub header: BTreeMap<String, String>,
}

/// `http_response` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpResponse {
    /// Numeric status code.
    pub code: u32,
    /// Status reason phrase, e.g. `OK`.
    pub status: String,
    /// Response headers, iterated in key order.
    #[serde(default, deserialize_with = "null_default")]
    pub header: BTreeMap<String, String>,
}

/// One DNS question or answer record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsRecord {
    /// Queried or answered name.
    pub name: String,
    /// Answered address, empty for questions and non-address answers.
    pub address: String,
}

/// `dns_message` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsMessage {
    /// `query` or `answer`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Question section.
    #[serde(default, deserialize_with = "null_default")]
    pub query: Vec<DnsRecord>,
    /// Answer section.
    #[serde(default, deserialize_with = "null_default")]
    pub answer: Vec<DnsRecord>,
}

impl DnsMessage {
    /// Normalized message kind: anything other than `query` is an answer.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        if self.kind == "query" { "query" } else { "answer" }
    }
}

/// `ftp_command` / `smtp_command` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolCommand {
    /// Command line as sent by the client.
    pub command: String,
}

/// `ftp_response` / `smtp_response` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolResponse {
    /// Numeric reply code.
    pub status: u32,
    /// Free-text reply lines.
    #[serde(default, deserialize_with = "null_default")]
    pub text: Vec<String>,
}

/// `smtp_data` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpData {
    /// Envelope sender.
    pub from: String,
    /// Envelope recipients.
    #[serde(default, deserialize_with = "null_default")]
    pub to: Vec<String>,
}

// =============================================================================
// ACTION
// =============================================================================

/// What the probe observed, with the payload that belongs to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    UnrecognisedDatagram,
    UnrecognisedStream,
    Icmp,
    HttpRequest(HttpRequest),
    HttpResponse(HttpResponse),
    DnsMessage(DnsMessage),
    FtpCommand(ProtocolCommand),
    FtpResponse(ProtocolResponse),
    SmtpCommand(ProtocolCommand),
    SmtpResponse(ProtocolResponse),
    SmtpData(SmtpData),
    /// Stream opened; carries no observation of its own.
    ConnectedUp,
    /// Stream closed; carries no observation of its own.
    ConnectedDown,
    /// Any action name this loader does not know.
    Unknown(String),
}

impl Action {
    /// The wire name of this action.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UnrecognisedDatagram => "unrecognised_datagram",
            Self::UnrecognisedStream => "unrecognised_stream",
            Self::Icmp => "icmp",
            Self::HttpRequest(_) => "http_request",
            Self::HttpResponse(_) => "http_response",
            Self::DnsMessage(_) => "dns_message",
            Self::FtpCommand(_) => "ftp_command",
            Self::FtpResponse(_) => "ftp_response",
            Self::SmtpCommand(_) => "smtp_command",
            Self::SmtpResponse(_) => "smtp_response",
            Self::SmtpData(_) => "smtp_data",
            Self::ConnectedUp => "connected_up",
            Self::ConnectedDown => "connected_down",
            Self::Unknown(name) => name,
        }
    }

    /// Stream lifecycle notifications are acknowledged without being stored.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(self, Self::ConnectedUp | Self::ConnectedDown)
    }
}

// =============================================================================
// EVENT
// =============================================================================

/// One decoded observation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unique event id assigned by the probe pipeline.
    pub id: String,
    /// Name of the reporting device.
    pub device: String,
    /// Event time in its wire lexical form.
    pub time: String,
    /// URL associated with the event, empty if none.
    pub url: String,
    /// Source address descriptors, outermost layer first.
    pub src: Vec<String>,
    /// Destination address descriptors, outermost layer first.
    pub dest: Vec<String>,
    /// Observed action and its payload.
    pub action: Action,
}

/// The JSON shape of an event before the action payload is selected.
#[derive(Debug, Deserialize)]
struct WireEvent {
    action: String,
    id: String,
    device: String,
    time: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    src: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    dest: Vec<String>,
    #[serde(default)]
    http_request: Option<HttpRequest>,
    #[serde(default)]
    http_response: Option<HttpResponse>,
    #[serde(default)]
    dns_message: Option<DnsMessage>,
    #[serde(default)]
    ftp_command: Option<ProtocolCommand>,
    #[serde(default)]
    ftp_response: Option<ProtocolResponse>,
    #[serde(default)]
    smtp_command: Option<ProtocolCommand>,
    #[serde(default)]
    smtp_response: Option<ProtocolResponse>,
    #[serde(default)]
    smtp_data: Option<SmtpData>,
}

impl From<WireEvent> for Event {
    fn from(wire: WireEvent) -> Self {
        let action = match wire.action.as_str() {
            "unrecognised_datagram" => Action::UnrecognisedDatagram,
            "unrecognised_stream" => Action::UnrecognisedStream,
            "icmp" => Action::Icmp,
            "http_request" => Action::HttpRequest(wire.http_request.unwrap_or_default()),
            "http_response" => Action::HttpResponse(wire.http_response.unwrap_or_default()),
            "dns_message" => Action::DnsMessage(wire.dns_message.unwrap_or_default()),
            "ftp_command" => Action::FtpCommand(wire.ftp_command.unwrap_or_default()),
            "ftp_response" => Action::FtpResponse(wire.ftp_response.unwrap_or_default()),
            "smtp_command" => Action::SmtpCommand(wire.smtp_command.unwrap_or_default()),
            "smtp_response" => Action::SmtpResponse(wire.smtp_response.unwrap_or_default()),
            "smtp_data" => Action::SmtpData(wire.smtp_data.unwrap_or_default()),
            "connected_up" => Action::ConnectedUp,
            "connected_down" => Action::ConnectedDown,
            _ => Action::Unknown(wire.action),
        };

        Self {
            id: wire.id,
            device: wire.device,
            time: wire.time,
            url: wire.url.unwrap_or_default(),
            src: wire.src,
            dest: wire.dest,
            action,
        }
    }
}

impl Event {
    /// Decode one JSON-encoded event.
    ///
    /// # Errors
    ///
    /// Returns `ObsError::Decode` if the payload exceeds `MAX_EVENT_BYTES`,
    /// is not valid JSON, or lacks one of `action`, `id`, `device`, `time`.
    pub fn from_json(payload: &[u8]) -> Result<Self, ObsError> {
        if payload.len() > MAX_EVENT_BYTES {
            return Err(ObsError::Decode(format!(
                "event of {} bytes exceeds limit of {} bytes",
                payload.len(),
                MAX_EVENT_BYTES
            )));
        }
        let wire: WireEvent =
            serde_json::from_slice(payload).map_err(|e| ObsError::Decode(e.to_string()))?;
        Ok(wire.into())
    }

    /// Create a minimal event, mostly useful for tests and tooling.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        device: impl Into<String>,
        time: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            id: id.into(),
            device: device.into(),
            time: time.into(),
            url: String::new(),
            src: Vec::new(),
            dest: Vec::new(),
            action,
        }
    }

    /// Set the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the source address list.
    #[must_use]
    pub fn with_src<I, S>(mut self, src: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.src = src.into_iter().map(Into::into).collect();
        self
    }

    /// Set the destination address list.
    #[must_use]
    pub fn with_dest<I, S>(mut self, dest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dest = dest.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// ADDRESS DESCRIPTORS
// =============================================================================

/// Protocol layer of an address descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressClass {
    Ipv4,
    Tcp,
    Udp,
    /// Any other class, including the whole descriptor when it has no `:`.
    Other(String),
}

/// A parsed `class:value` address descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDescriptor {
    /// Protocol layer.
    pub class: AddressClass,
    /// Address or port; empty if the descriptor had no separator.
    pub value: String,
}

impl AddressDescriptor {
    /// Split on the first `:`. Total: malformed input yields an empty value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (class, value) = raw.split_once(':').unwrap_or((raw, ""));
        let class = match class {
            "ipv4" => AddressClass::Ipv4,
            "tcp" => AddressClass::Tcp,
            "udp" => AddressClass::Udp,
            other => AddressClass::Other(other.to_string()),
        };
        Self {
            class,
            value: value.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
