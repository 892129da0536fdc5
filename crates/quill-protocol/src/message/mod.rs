//! The [`WireMessage`] value exchanged between host and plugin.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HeaderError;
use crate::header::{Action, Header, HeaderFields, MessageKind, Source};

/// Caller-assigned id linking a request to its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(i32);

impl CorrelationId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

static NEXT_REPLY_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque address of a channel endpoint that accepts responses.
///
/// Handles are carried next to the header, never inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyHandle(u64);

impl ReplyHandle {
    /// Allocates a process-unique handle.
    #[must_use]
    pub fn allocate() -> Self {
        Self(NEXT_REPLY_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a handle received from a remote endpoint.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReplyHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// One protocol message.
///
/// Messages are immutable once built; the `with_*` builders consume and
/// return the value so construction reads as a single expression.
///
/// # Example
///
/// ```
/// use quill_protocol::{Action, CorrelationId, MessageKind, Source, WireMessage};
///
/// let request = WireMessage::request_to_plugin(Action::Spell, CorrelationId::new(7))
///     .with_string("teh");
/// let fields = request.metadata().expect("valid header");
/// assert_eq!(fields.source, Source::Host);
/// assert_eq!(fields.kind, MessageKind::Request);
/// assert_eq!(request.string_payload(), Some("teh"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WireMessage {
    header: Header,
    correlation_id: CorrelationId,
    string_payload: Option<String>,
    binary_payload: Option<Value>,
    reply_handle: Option<ReplyHandle>,
}

impl WireMessage {
    /// Builds a message from an already packed header.
    #[must_use]
    pub const fn new(header: Header, correlation_id: CorrelationId) -> Self {
        Self {
            header,
            correlation_id,
            string_payload: None,
            binary_payload: None,
            reply_handle: None,
        }
    }

    fn directed(source: Source, kind: MessageKind, action: Action, id: CorrelationId) -> Self {
        Self::new(Header::encode(source, kind, action.code()), id)
    }

    /// A host request addressed to a plugin.
    #[must_use]
    pub fn request_to_plugin(action: Action, id: CorrelationId) -> Self {
        Self::directed(Source::Host, MessageKind::Request, action, id)
    }

    /// A plugin response answering a host request.
    #[must_use]
    pub fn reply_to_host(action: Action, id: CorrelationId) -> Self {
        Self::directed(Source::Plugin, MessageKind::Response, action, id)
    }

    /// An unsolicited plugin request addressed to the host.
    #[must_use]
    pub fn request_to_host(action: Action, id: CorrelationId) -> Self {
        Self::directed(Source::Plugin, MessageKind::Request, action, id)
    }

    /// A host response answering a plugin request.
    #[must_use]
    pub fn reply_to_plugin(action: Action, id: CorrelationId) -> Self {
        Self::directed(Source::Host, MessageKind::Response, action, id)
    }

    /// Attaches a string payload.
    #[must_use]
    pub fn with_string(mut self, payload: impl Into<String>) -> Self {
        self.string_payload = Some(payload.into());
        self
    }

    /// Attaches an optional string payload, keeping `None` as absent.
    #[must_use]
    pub fn with_optional_string(mut self, payload: Option<String>) -> Self {
        self.string_payload = payload;
        self
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_binary(mut self, payload: Value) -> Self {
        self.binary_payload = Some(payload);
        self
    }

    /// Attaches an optional structured payload.
    #[must_use]
    pub fn with_optional_binary(mut self, payload: Option<Value>) -> Self {
        self.binary_payload = payload;
        self
    }

    /// Sets the reply target.
    #[must_use]
    pub const fn with_reply_handle(mut self, handle: Option<ReplyHandle>) -> Self {
        self.reply_handle = handle;
        self
    }

    /// Returns the packed header.
    #[must_use]
    pub const fn header(&self) -> Header {
        self.header
    }

    /// Decodes the header fields.
    ///
    /// # Errors
    ///
    /// Returns a [`HeaderError`] when the source or kind nibble is undefined.
    pub fn metadata(&self) -> Result<HeaderFields, HeaderError> {
        self.header.decode()
    }

    /// Returns the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn string_payload(&self) -> Option<&str> {
        self.string_payload.as_deref()
    }

    /// Returns the structured payload, if any.
    #[must_use]
    pub const fn binary_payload(&self) -> Option<&Value> {
        self.binary_payload.as_ref()
    }

    /// Returns the reply target, if any.
    #[must_use]
    pub const fn reply_handle(&self) -> Option<ReplyHandle> {
        self.reply_handle
    }

    /// Returns `true` when the header marks a request.
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self.metadata(), Ok(fields) if fields.kind == MessageKind::Request)
    }

    /// Returns `true` when the header marks a response.
    #[must_use]
    pub fn is_response(&self) -> bool {
        matches!(self.metadata(), Ok(fields) if fields.kind == MessageKind::Response)
    }

    /// Splits the message into its owned payload parts.
    #[must_use]
    pub fn into_payloads(self) -> (Option<String>, Option<Value>) {
        (self.string_payload, self.binary_payload)
    }
}
