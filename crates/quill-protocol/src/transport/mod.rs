//! Bidirectional message channels.
//!
//! A [`Channel`] sends [`WireMessage`]s to a single peer and delivers the
//! peer's messages to a registered handler. Delivery runs on a Tokio task
//! owned by the channel, in arrival order. When the peer goes away the
//! handler receives [`ChannelEvent::Closed`] exactly once.

mod framing;
mod local;
mod stream;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

pub use self::framing::{MAX_FRAME_LEN, read_frame, write_frame};
pub use self::local::LocalChannel;
pub use self::stream::StreamChannel;
use crate::error::TransportError;
use crate::message::{ReplyHandle, WireMessage};

/// Log target for transport events.
pub(crate) const TRANSPORT_TARGET: &str = "quill_protocol::transport";

/// Something a channel delivers to its handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A message from the peer.
    Message(WireMessage),
    /// The peer is gone; no further events follow.
    Closed,
}

/// Callback invoked for every [`ChannelEvent`].
pub type MessageHandler = Arc<dyn Fn(ChannelEvent) + Send + Sync>;

/// A transport to one peer.
pub trait Channel: Send + Sync {
    /// Sends a message to the peer.
    ///
    /// Requests without a reply target are stamped with
    /// [`Channel::reply_handle`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] when the channel is unbound, or
    /// [`TransportError::UnknownReplyTarget`] when a response is addressed to
    /// an endpoint this channel cannot reach.
    fn send(&self, message: WireMessage) -> Result<(), TransportError>;

    /// Registers the handler for inbound events, replacing any previous one.
    ///
    /// Must be called within a Tokio runtime. Events that arrive before the
    /// first registration are buffered.
    fn on_receive(&self, handler: MessageHandler);

    /// Returns `true` while the peer is reachable.
    fn is_bound(&self) -> bool;

    /// The address the peer replies to.
    fn reply_handle(&self) -> ReplyHandle;

    /// Unbinds the channel and notifies both ends.
    fn close(&self);
}

/// Inbound queue shared by the channel implementations.
pub(crate) struct Inbox {
    sender: mpsc::UnboundedSender<ChannelEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<ChannelEvent>>>,
    handler: Arc<Mutex<Option<MessageHandler>>>,
}

impl Inbox {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            handler: Arc::new(Mutex::new(None)),
        }
    }

    /// A sender that feeds this inbox.
    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<ChannelEvent> {
        self.sender.clone()
    }

    pub(crate) fn register(&self, handler: MessageHandler) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);

        let pending = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut receiver) = pending else {
            return;
        };

        let slot = Arc::clone(&self.handler);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let closed = event == ChannelEvent::Closed;
                let current = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
                if let Some(deliver) = current {
                    deliver(event);
                }
                if closed {
                    debug!(target: TRANSPORT_TARGET, "inbox pump finished");
                    break;
                }
            }
        });
    }
}

/// Delivers [`ChannelEvent::Closed`] to an inbox that may already be gone.
pub(crate) fn notify_closed(inbox: &mpsc::UnboundedSender<ChannelEvent>) {
    if inbox.send(ChannelEvent::Closed).is_err() {
        debug!(target: TRANSPORT_TARGET, "close event had no listener");
    }
}
