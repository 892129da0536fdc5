//! Provider reached through a [`Channel`].
//!
//! Each request gets a fresh correlation id and a pending entry holding a
//! single-fire resolver. The channel handler resolves entries as responses
//! arrive and, when the channel closes, resolves every remaining entry as
//! unspecified so no caller waits forever.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Instant;

use async_trait::async_trait;
use quill_protocol::payload::{
    self, CandidateData, CandidateNotice, ComputedSubtype, SpellingResult, SubtypeSupportInfo,
    WordRequest,
};
use quill_protocol::{
    Action, Channel, ChannelEvent, CorrelationId, MessageKind, PayloadError, WireMessage,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::candidate::SuggestionCandidate;
use crate::errors::ProviderError;
use crate::provider::{ProviderId, ProviderMetadata, SuggestionProvider};

/// Log target for proxy events.
pub(crate) const PROXY_TARGET: &str = "quill_host::proxy";

static NEXT_CORRELATION_ID: AtomicI32 = AtomicI32::new(1);

/// How a pending request ended.
#[derive(Debug)]
enum Resolution {
    Response(WireMessage),
    Unspecified,
}

struct PendingRequest {
    action: Action,
    issued_at: Instant,
    resolver: oneshot::Sender<Resolution>,
}

/// Pending requests of one proxy.
struct PendingTable {
    provider: ProviderId,
    entries: Mutex<HashMap<CorrelationId, PendingRequest>>,
    torn_down: AtomicBool,
}

impl PendingTable {
    fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            entries: Mutex::new(HashMap::new()),
            torn_down: AtomicBool::new(false),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<CorrelationId, PendingRequest>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a request under an id no pending request uses.
    fn register(
        &self,
        action: Action,
    ) -> Result<(CorrelationId, oneshot::Receiver<Resolution>), ProviderError> {
        let mut entries = self.entries();
        if self.torn_down.load(Ordering::Acquire) {
            return Err(ProviderError::transport_closed(&self.provider));
        }
        let id = loop {
            let candidate = CorrelationId::new(NEXT_CORRELATION_ID.fetch_add(1, Ordering::Relaxed));
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        let (resolver, receiver) = oneshot::channel();
        entries.insert(
            id,
            PendingRequest {
                action,
                issued_at: Instant::now(),
                resolver,
            },
        );
        Ok((id, receiver))
    }

    fn forget(&self, id: CorrelationId) {
        self.entries().remove(&id);
    }

    fn resolve(&self, response: WireMessage) {
        let id = response.correlation_id();
        let Some(pending) = self.entries().remove(&id) else {
            let error = ProviderError::unexpected_response(&self.provider, id);
            warn!(target: PROXY_TARGET, %error, "ignoring response");
            return;
        };
        debug!(
            target: PROXY_TARGET,
            provider = %self.provider,
            action = %pending.action,
            correlation_id = %id,
            elapsed_ms = pending.issued_at.elapsed().as_millis(),
            "response resolved"
        );
        if pending.resolver.send(Resolution::Response(response)).is_err() {
            debug!(target: PROXY_TARGET, correlation_id = %id, "caller stopped waiting");
        }
    }

    fn tear_down(&self) {
        self.torn_down.store(true, Ordering::Release);
        let drained: Vec<_> = self.entries().drain().collect();
        if !drained.is_empty() {
            warn!(
                target: PROXY_TARGET,
                provider = %self.provider,
                pending = drained.len(),
                "channel closed with requests outstanding"
            );
        }
        for (id, pending) in drained {
            if pending.resolver.send(Resolution::Unspecified).is_err() {
                debug!(target: PROXY_TARGET, correlation_id = %id, "caller stopped waiting");
            }
        }
        info!(target: PROXY_TARGET, provider = %self.provider, "provider channel closed");
    }
}

/// A [`SuggestionProvider`] backed by a plugin on the far side of a channel.
pub struct ProviderProxy {
    metadata: ProviderMetadata,
    channel: Arc<dyn Channel>,
    pending: Arc<PendingTable>,
}

impl ProviderProxy {
    /// Wraps `channel` and starts listening for responses.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(metadata: ProviderMetadata, channel: Arc<dyn Channel>) -> Self {
        let pending = Arc::new(PendingTable::new(metadata.id.clone()));
        let handler_pending = Arc::clone(&pending);
        let weak_channel = Arc::downgrade(&channel);
        channel.on_receive(Arc::new(move |event| {
            handle_event(&handler_pending, &weak_channel, event);
        }));
        info!(target: PROXY_TARGET, provider = %metadata.id, "provider proxy bound");
        Self {
            metadata,
            channel,
            pending,
        }
    }

    /// Number of requests awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.entries().len()
    }

    /// Sends a request and waits for its response.
    ///
    /// `Ok(None)` means the request was resolved as unspecified because the
    /// channel closed first.
    async fn request(
        &self,
        action: Action,
        string_payload: Option<String>,
        binary_payload: Option<Value>,
    ) -> Result<Option<WireMessage>, ProviderError> {
        if !self.is_bound() {
            warn!(
                target: PROXY_TARGET,
                provider = %self.metadata.id,
                %action,
                "call on unbound provider"
            );
            return Err(ProviderError::unavailable(&self.metadata.id));
        }

        let (id, receiver) = self.pending.register(action)?;
        let message = WireMessage::request_to_plugin(action, id)
            .with_optional_string(string_payload)
            .with_optional_binary(binary_payload);
        debug!(
            target: PROXY_TARGET,
            provider = %self.metadata.id,
            %action,
            correlation_id = %id,
            "sending request"
        );
        if let Err(error) = self.channel.send(message) {
            self.pending.forget(id);
            return Err(ProviderError::transport(&self.metadata.id, error));
        }

        match receiver.await {
            Ok(Resolution::Response(response)) => Ok(Some(response)),
            Ok(Resolution::Unspecified) | Err(_) => Ok(None),
        }
    }

    fn encode<T: serde::Serialize>(&self, action: Action, value: &T) -> Result<Value, ProviderError> {
        payload::encode_binary(value)
            .map_err(|source| ProviderError::payload(&self.metadata.id, action, source))
    }

    fn decode_error(&self, action: Action) -> impl FnOnce(PayloadError) -> ProviderError + '_ {
        move |source| ProviderError::payload(&self.metadata.id, action, source)
    }

    /// Decodes a structured reply. A reply without a payload resolves as
    /// `fallback`, the same as an unspecified result.
    fn decode_reply<T: DeserializeOwned>(
        &self,
        action: Action,
        response: &WireMessage,
        fallback: T,
    ) -> Result<T, ProviderError> {
        if response.binary_payload().is_none() {
            debug!(
                target: PROXY_TARGET,
                provider = %self.metadata.id,
                %action,
                correlation_id = %response.correlation_id(),
                "reply carried no payload"
            );
            return Ok(fallback);
        }
        payload::decode_binary(response.binary_payload()).map_err(self.decode_error(action))
    }

    async fn notify(
        &self,
        action: Action,
        subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<Option<WireMessage>, ProviderError> {
        let notice = CandidateNotice {
            subtype_id,
            candidate: candidate.to_data(),
        };
        let binary = self.encode(action, &notice)?;
        self.request(action, None, Some(binary)).await
    }
}

#[async_trait]
impl SuggestionProvider for ProviderProxy {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn is_bound(&self) -> bool {
        !self.pending.torn_down.load(Ordering::Acquire) && self.channel.is_bound()
    }

    async fn evaluate_is_supported(
        &self,
        subtype: &ComputedSubtype,
    ) -> Result<SubtypeSupportInfo, ProviderError> {
        let action = Action::EvaluateSupport;
        let binary = self.encode(action, subtype)?;
        let Some(response) = self.request(action, None, Some(binary)).await? else {
            return Ok(SubtypeSupportInfo::unspecified());
        };
        self.decode_reply(action, &response, SubtypeSupportInfo::unspecified())
    }

    async fn preload(&self, subtype: &ComputedSubtype) -> Result<(), ProviderError> {
        let action = Action::Preload;
        let binary = self.encode(action, subtype)?;
        self.request(action, None, Some(binary)).await?;
        Ok(())
    }

    async fn spell(&self, request: &WordRequest) -> Result<SpellingResult, ProviderError> {
        let action = Action::Spell;
        let binary = self.encode(action, request)?;
        let Some(response) = self.request(action, None, Some(binary)).await? else {
            return Ok(SpellingResult::unspecified());
        };
        self.decode_reply(action, &response, SpellingResult::unspecified())
    }

    async fn suggest(
        &self,
        request: &WordRequest,
    ) -> Result<Vec<SuggestionCandidate>, ProviderError> {
        let action = Action::Suggest;
        let binary = self.encode(action, request)?;
        let Some(response) = self.request(action, None, Some(binary)).await? else {
            return Ok(Vec::new());
        };
        let candidates: Vec<CandidateData> = self.decode_reply(action, &response, Vec::new())?;
        Ok(candidates
            .into_iter()
            .map(|data| SuggestionCandidate::from_data(data, self.metadata.id.clone()))
            .collect())
    }

    async fn notify_suggestion_accepted(
        &self,
        subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<(), ProviderError> {
        self.notify(Action::NotifyAccepted, subtype_id, candidate)
            .await
            .map(|_| ())
    }

    async fn notify_suggestion_reverted(
        &self,
        subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<(), ProviderError> {
        self.notify(Action::NotifyReverted, subtype_id, candidate)
            .await
            .map(|_| ())
    }

    async fn remove_suggestion(
        &self,
        subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<bool, ProviderError> {
        let action = Action::RemoveSuggestion;
        let Some(response) = self.notify(action, subtype_id, candidate).await? else {
            return Ok(false);
        };
        match response.string_payload() {
            None => Ok(false),
            text => payload::decode_bool(text).map_err(self.decode_error(action)),
        }
    }
}

fn handle_event(pending: &PendingTable, channel: &Weak<dyn Channel>, event: ChannelEvent) {
    let message = match event {
        ChannelEvent::Message(message) => message,
        ChannelEvent::Closed => {
            pending.tear_down();
            return;
        }
    };
    let fields = match message.metadata() {
        Ok(fields) => fields,
        Err(error) => {
            warn!(target: PROXY_TARGET, provider = %pending.provider, %error, "ignoring undecodable header");
            return;
        }
    };
    match fields.kind {
        MessageKind::Response => pending.resolve(message),
        MessageKind::Request => match fields.action() {
            Ok(action) => answer_plugin_request(pending, channel, action, &message),
            Err(error) => {
                warn!(target: PROXY_TARGET, provider = %pending.provider, %error, "ignoring plugin request");
            }
        },
    }
}

/// Answers a request the plugin sent to the host.
///
/// Every action names a host-to-plugin operation, so the host acknowledges
/// each with an empty response.
fn answer_plugin_request(
    pending: &PendingTable,
    channel: &Weak<dyn Channel>,
    action: Action,
    request: &WireMessage,
) {
    match action {
        Action::EvaluateSupport
        | Action::Preload
        | Action::Spell
        | Action::Suggest
        | Action::NotifyAccepted
        | Action::NotifyReverted
        | Action::RemoveSuggestion => {
            debug!(
                target: PROXY_TARGET,
                provider = %pending.provider,
                %action,
                "plugin-initiated request has no host handler"
            );
        }
    }

    let Some(live) = channel.upgrade() else {
        return;
    };
    let reply = WireMessage::reply_to_plugin(action, request.correlation_id())
        .with_reply_handle(request.reply_handle());
    if let Err(error) = live.send(reply) {
        warn!(target: PROXY_TARGET, provider = %pending.provider, %error, "failed to answer plugin request");
    }
}
