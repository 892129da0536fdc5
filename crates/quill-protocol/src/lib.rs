//! Wire protocol shared by the Quill host and its suggestion plugins.
//!
//! Every exchange is a [`WireMessage`]: a bit-packed [`Header`] naming the
//! sender, the message kind and the [`Action`], a [`CorrelationId`] echoed by
//! the responder, and optional string and structured payloads. Messages move
//! over a [`Channel`]; the crate ships an in-memory pair for tests and
//! in-process plugins, and a framed byte-stream channel for plugins running
//! in another process.

mod envelope;
mod error;
mod header;
mod message;
pub mod payload;
pub mod transport;

pub use envelope::{MESSAGE_DATA_KEY, TransportEnvelope};
pub use error::{EnvelopeError, HeaderError, PayloadError, TransportError};
pub use header::{Action, FIELD_MASK, Header, HeaderFields, MessageKind, Source};
pub use message::{CorrelationId, ReplyHandle, WireMessage};
pub use transport::{Channel, ChannelEvent, LocalChannel, MessageHandler, StreamChannel};
