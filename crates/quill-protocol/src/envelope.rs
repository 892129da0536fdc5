//! Transport form of a [`WireMessage`].
//!
//! The envelope mirrors the primitive message shape most IPC layers offer:
//! an integer `what` slot for the header, an integer argument for the
//! correlation id, a string bundle, an object slot, and a reply address.
//! Byte-stream transports serialise envelopes as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnvelopeError;
use crate::header::Header;
use crate::message::{CorrelationId, ReplyHandle, WireMessage};

/// Bundle key holding the string payload.
pub const MESSAGE_DATA_KEY: &str = "org.quill.plugin.MESSAGE_DATA";

/// Primitive message as handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportEnvelope {
    /// Packed header word.
    pub what: u32,
    /// Correlation id.
    pub arg1: i32,
    /// String bundle; the payload lives under [`MESSAGE_DATA_KEY`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<Value>,
    /// Reply address for requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyHandle>,
}

impl TransportEnvelope {
    /// Serialises the envelope for a byte-stream transport.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Codec`] if JSON encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses an envelope received from a byte-stream transport.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Codec`] if the bytes are not a valid envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl WireMessage {
    /// Converts the message into its transport form.
    ///
    /// An absent string payload leaves the bundle empty so it decodes back
    /// to `None` rather than an empty string.
    #[must_use]
    pub fn to_envelope(&self) -> TransportEnvelope {
        let mut data = BTreeMap::new();
        if let Some(payload) = self.string_payload() {
            data.insert(MESSAGE_DATA_KEY.to_owned(), payload.to_owned());
        }
        TransportEnvelope {
            what: self.header().raw(),
            arg1: self.correlation_id().get(),
            data,
            obj: self.binary_payload().cloned(),
            reply_to: self.reply_handle(),
        }
    }

    /// Rebuilds a message from its transport form.
    #[must_use]
    pub fn from_envelope(envelope: TransportEnvelope) -> Self {
        let TransportEnvelope {
            what,
            arg1,
            mut data,
            obj,
            reply_to,
        } = envelope;
        Self::new(Header::from_raw(what), CorrelationId::new(arg1))
            .with_optional_string(data.remove(MESSAGE_DATA_KEY))
            .with_optional_binary(obj)
            .with_reply_handle(reply_to)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::header::Action;

    #[rstest]
    fn absent_string_payload_stays_absent() {
        let message = WireMessage::reply_to_host(Action::Preload, CorrelationId::new(4));
        let envelope = message.to_envelope();
        assert!(envelope.data.is_empty());

        let bytes = envelope.to_bytes().expect("encode");
        let decoded =
            WireMessage::from_envelope(TransportEnvelope::from_bytes(&bytes).expect("decode"));
        assert_eq!(decoded.string_payload(), None);
    }

    #[rstest]
    fn empty_string_payload_is_not_confused_with_absent() {
        let message =
            WireMessage::reply_to_host(Action::Spell, CorrelationId::new(5)).with_string("");
        let decoded = WireMessage::from_envelope(message.to_envelope());
        assert_eq!(decoded.string_payload(), Some(""));
    }

    #[rstest]
    fn preserves_id_payload_and_reply_target_through_bytes() {
        let message = WireMessage::request_to_plugin(Action::Suggest, CorrelationId::new(-12))
            .with_string("word")
            .with_binary(json!({"candidates": ["a", "b"]}))
            .with_reply_handle(Some(ReplyHandle::from_raw(77)));

        let bytes = message.to_envelope().to_bytes().expect("encode");
        let decoded =
            WireMessage::from_envelope(TransportEnvelope::from_bytes(&bytes).expect("decode"));

        assert_eq!(decoded, message);
    }

    #[rstest]
    fn reply_target_is_not_part_of_the_header() {
        let plain = WireMessage::request_to_plugin(Action::Spell, CorrelationId::new(1));
        let routed = plain
            .clone()
            .with_reply_handle(Some(ReplyHandle::from_raw(u64::MAX)));
        assert_eq!(plain.to_envelope().what, routed.to_envelope().what);
    }

    #[rstest]
    fn rejects_garbage_bytes() {
        assert!(matches!(
            TransportEnvelope::from_bytes(b"not json"),
            Err(EnvelopeError::Codec(_))
        ));
    }
}
