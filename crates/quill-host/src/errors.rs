//! Error types surfaced by suggestion providers.

use quill_protocol::{Action, CorrelationId, PayloadError, TransportError};
use thiserror::Error;

use crate::provider::ProviderId;

/// Errors returned by [`crate::SuggestionProvider`] operations.
///
/// None of these reach the user: the orchestrator treats every variant as
/// "no suggestions".
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No bound provider can serve the call.
    #[error("provider '{provider}' is unavailable")]
    ProviderUnavailable {
        /// Provider the caller asked for.
        provider: ProviderId,
    },

    /// A response named a correlation id with no pending request.
    #[error("provider '{provider}' sent an unexpected response for request {correlation_id}")]
    UnexpectedResponse {
        /// Provider that sent the response.
        provider: ProviderId,
        /// Correlation id carried by the response.
        correlation_id: CorrelationId,
    },

    /// The channel closed while the request was outstanding.
    #[error("transport to provider '{provider}' closed")]
    TransportClosed {
        /// Provider whose channel closed.
        provider: ProviderId,
    },

    /// The channel refused the request.
    #[error("transport to provider '{provider}' failed: {source}")]
    Transport {
        /// Provider addressed.
        provider: ProviderId,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// A request or response payload could not be encoded or decoded.
    #[error("provider '{provider}' exchanged a bad {action} payload: {source}")]
    Payload {
        /// Provider addressed.
        provider: ProviderId,
        /// Action whose payload failed.
        action: Action,
        /// Underlying payload error.
        #[source]
        source: PayloadError,
    },
}

impl ProviderError {
    /// Builds a `ProviderUnavailable` error.
    pub(crate) fn unavailable(provider: &ProviderId) -> Self {
        Self::ProviderUnavailable {
            provider: provider.clone(),
        }
    }

    /// Builds an `UnexpectedResponse` error.
    pub(crate) fn unexpected_response(provider: &ProviderId, correlation_id: CorrelationId) -> Self {
        Self::UnexpectedResponse {
            provider: provider.clone(),
            correlation_id,
        }
    }

    /// Builds a `TransportClosed` error.
    pub(crate) fn transport_closed(provider: &ProviderId) -> Self {
        Self::TransportClosed {
            provider: provider.clone(),
        }
    }

    /// Wraps a transport failure; a closed channel maps to `TransportClosed`.
    pub(crate) fn transport(provider: &ProviderId, source: TransportError) -> Self {
        match source {
            TransportError::Closed => Self::transport_closed(provider),
            source => Self::Transport {
                provider: provider.clone(),
                source,
            },
        }
    }

    /// Wraps a payload failure for `action`.
    pub(crate) fn payload(provider: &ProviderId, action: Action, source: PayloadError) -> Self {
        Self::Payload {
            provider: provider.clone(),
            action,
            source,
        }
    }
}
