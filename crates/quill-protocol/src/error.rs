//! Errors raised while encoding, decoding, or transporting messages.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::message::ReplyHandle;

/// A header word that cannot be interpreted.
///
/// Reserved bits never produce this error; only undefined values inside
/// the defined fields do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The source nibble holds an undefined value.
    #[error("unknown message source {code}")]
    UnknownSource {
        /// Raw nibble value.
        code: u32,
    },
    /// The kind nibble holds an undefined value.
    #[error("unknown message kind {code}")]
    UnknownKind {
        /// Raw nibble value.
        code: u32,
    },
    /// The action byte holds an undefined value.
    #[error("unknown action code {code}")]
    UnknownAction {
        /// Raw action byte.
        code: u8,
    },
}

/// Failures converting between messages and their transport form.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The envelope could not be serialised or parsed as JSON.
    #[error("envelope codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A frame arrived without a `Content-Length` header.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// A frame header could not be parsed.
    #[error("invalid frame header: {line}")]
    InvalidHeader {
        /// The offending header line.
        line: String,
    },

    /// A frame declared more content than a single frame may carry.
    #[error("frame of {length} bytes exceeds the frame size limit")]
    FrameTooLarge {
        /// Declared content length.
        length: usize,
    },

    /// The byte stream failed or ended inside a frame.
    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures decoding a typed payload carried by a message.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The message carried no payload of the expected form.
    #[error("message has no {expected} payload")]
    Missing {
        /// Which payload slot was empty.
        expected: &'static str,
    },
    /// The binary payload did not match the expected structure.
    #[error("malformed binary payload: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The string payload did not hold a boolean.
    #[error("expected a boolean string payload, got '{value}'")]
    NotBoolean {
        /// The text that was received.
        value: String,
    },
}

/// Transport-layer failures reported by a [`Channel`](crate::Channel).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The channel is not bound to a live peer.
    #[error("transport is closed")]
    Closed,

    /// A response named a reply target this channel cannot reach.
    #[error("no route to reply target {handle}")]
    UnknownReplyTarget {
        /// The unreachable handle.
        handle: ReplyHandle,
    },

    /// An I/O error on the underlying byte stream.
    #[error("transport I/O error: {0}")]
    Io(Arc<io::Error>),

    /// An envelope could not be encoded for sending.
    #[error("failed to encode envelope: {message}")]
    Envelope {
        /// Human-readable failure description.
        message: String,
    },
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        Self::Io(Arc::new(error))
    }
}
