//! Errors raised while serving host requests.

use quill_protocol::{Action, HeaderError, PayloadError, TransportError};
use thiserror::Error;

/// Errors raised by the plugin-side dispatcher.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The inbound header could not be decoded.
    #[error("undecodable request header: {0}")]
    Header(#[from] HeaderError),
    /// A request or reply payload could not be converted.
    #[error("bad {action} payload: {source}")]
    Payload {
        /// Action whose payload failed.
        action: Action,
        /// Underlying payload error.
        #[source]
        source: PayloadError,
    },
    /// The reply could not be sent.
    #[error("failed to send reply: {0}")]
    Transport(#[from] TransportError),
}
