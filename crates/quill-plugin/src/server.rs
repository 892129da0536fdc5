//! Answers host requests arriving on a channel.

use std::sync::{Arc, Weak};

use quill_protocol::payload::{self, CandidateNotice, ComputedSubtype, WordRequest};
use quill_protocol::{
    Action, Channel, ChannelEvent, MessageKind, ReplyHandle, TransportError, WireMessage,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ServeError;
use crate::service::PluginService;

/// Log target for server events.
const SERVER_TARGET: &str = "quill_plugin::server";

/// Payload carried by a reply.
#[derive(Debug)]
enum Answer {
    Empty,
    Text(&'static str),
    Binary(Value),
}

/// Dispatches every request on a channel to a [`PluginService`].
///
/// Each request is served on its own task, so a slow operation never holds
/// up the others; replies may therefore leave in a different order than the
/// requests arrived.
pub struct PluginServer {
    channel: Arc<dyn Channel>,
    closed: watch::Receiver<bool>,
}

impl PluginServer {
    /// Starts serving `channel`.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn bind(service: Arc<dyn PluginService>, channel: Arc<dyn Channel>) -> Self {
        let (closed_sender, closed) = watch::channel(false);
        let weak_channel = Arc::downgrade(&channel);
        channel.on_receive(Arc::new(move |event| match event {
            ChannelEvent::Message(message) => accept(&service, &weak_channel, message),
            ChannelEvent::Closed => {
                info!(target: SERVER_TARGET, "host channel closed");
                closed_sender.send_replace(true);
            }
        }));
        info!(
            target: SERVER_TARGET,
            handle = %channel.reply_handle(),
            "plugin server bound"
        );
        Self { channel, closed }
    }

    /// Whether the host is still connected.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.channel.is_bound()
    }

    /// This end's reply handle.
    #[must_use]
    pub fn reply_handle(&self) -> ReplyHandle {
        self.channel.reply_handle()
    }

    /// Resolves once the host channel has closed.
    pub async fn closed(&self) {
        let mut receiver = self.closed.clone();
        if receiver.wait_for(|is_closed| *is_closed).await.is_err() {
            debug!(target: SERVER_TARGET, "channel dropped without a close event");
        }
    }

    /// Stops serving and closes the channel.
    pub fn shutdown(&self) {
        self.channel.close();
    }
}

fn accept(service: &Arc<dyn PluginService>, channel: &Weak<dyn Channel>, message: WireMessage) {
    let fields = match message.metadata() {
        Ok(fields) => fields,
        Err(source) => {
            let error = ServeError::from(source);
            warn!(target: SERVER_TARGET, %error, "ignoring message");
            return;
        }
    };
    match fields.kind {
        MessageKind::Response => {
            warn!(
                target: SERVER_TARGET,
                correlation_id = %message.correlation_id(),
                "ignoring response to a request this plugin never sent"
            );
        }
        MessageKind::Request => match fields.action() {
            Ok(action) => {
                let task_service = Arc::clone(service);
                let task_channel = Weak::clone(channel);
                tokio::spawn(async move {
                    let correlation_id = message.correlation_id();
                    if let Err(error) =
                        serve(task_service.as_ref(), &task_channel, action, message).await
                    {
                        warn!(target: SERVER_TARGET, %action, %correlation_id, %error, "request not answered");
                    }
                });
            }
            Err(source) => {
                let error = ServeError::from(source);
                warn!(target: SERVER_TARGET, %error, "ignoring request");
            }
        },
    }
}

/// Answers one request.
///
/// A request whose payload cannot be decoded still gets a reply, with no
/// payload, so the host never waits on it.
async fn serve(
    service: &dyn PluginService,
    channel: &Weak<dyn Channel>,
    action: Action,
    request: WireMessage,
) -> Result<(), ServeError> {
    debug!(
        target: SERVER_TARGET,
        %action,
        correlation_id = %request.correlation_id(),
        "serving request"
    );
    let outcome = answer(service, action, &request)
        .await
        .unwrap_or_else(|error| {
            warn!(target: SERVER_TARGET, %error, "replying without payload");
            Answer::Empty
        });

    let base = WireMessage::reply_to_host(action, request.correlation_id())
        .with_reply_handle(request.reply_handle());
    let reply = match outcome {
        Answer::Empty => base,
        Answer::Text(text) => base.with_string(text),
        Answer::Binary(value) => base.with_binary(value),
    };
    let live = channel.upgrade().ok_or(TransportError::Closed)?;
    live.send(reply)?;
    Ok(())
}

/// The total handler table: one arm per action.
async fn answer(
    service: &dyn PluginService,
    action: Action,
    request: &WireMessage,
) -> Result<Answer, ServeError> {
    match action {
        Action::EvaluateSupport => {
            let subtype: ComputedSubtype = decode(action, request)?;
            encode(action, &service.evaluate_is_supported(subtype).await)
        }
        Action::Preload => {
            let subtype: ComputedSubtype = decode(action, request)?;
            service.preload(subtype).await;
            Ok(Answer::Empty)
        }
        Action::Spell => {
            let word: WordRequest = decode(action, request)?;
            encode(action, &service.spell(word).await)
        }
        Action::Suggest => {
            let word: WordRequest = decode(action, request)?;
            encode(action, &service.suggest(word).await)
        }
        Action::NotifyAccepted => {
            let notice: CandidateNotice = decode(action, request)?;
            service.notify_suggestion_accepted(notice).await;
            Ok(Answer::Empty)
        }
        Action::NotifyReverted => {
            let notice: CandidateNotice = decode(action, request)?;
            service.notify_suggestion_reverted(notice).await;
            Ok(Answer::Empty)
        }
        Action::RemoveSuggestion => {
            let notice: CandidateNotice = decode(action, request)?;
            let removed = service.remove_suggestion(notice).await;
            Ok(Answer::Text(payload::encode_bool(removed)))
        }
    }
}

fn decode<T: DeserializeOwned>(action: Action, request: &WireMessage) -> Result<T, ServeError> {
    payload::decode_binary(request.binary_payload())
        .map_err(|source| ServeError::Payload { action, source })
}

fn encode<T: Serialize>(action: Action, value: &T) -> Result<Answer, ServeError> {
    payload::encode_binary(value)
        .map(Answer::Binary)
        .map_err(|source| ServeError::Payload { action, source })
}
