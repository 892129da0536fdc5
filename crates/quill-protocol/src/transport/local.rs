//! In-process channel pair.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{Channel, ChannelEvent, Inbox, MessageHandler, TRANSPORT_TARGET, notify_closed};
use crate::error::TransportError;
use crate::message::{ReplyHandle, WireMessage};

/// One end of a connected in-memory channel pair.
///
/// Closing or dropping either end unbinds both and delivers
/// [`ChannelEvent::Closed`] to each.
pub struct LocalChannel {
    handle: ReplyHandle,
    peer_handle: ReplyHandle,
    bound: Arc<AtomicBool>,
    to_peer: mpsc::UnboundedSender<ChannelEvent>,
    inbox: Inbox,
}

impl LocalChannel {
    /// Creates two connected ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let bound = Arc::new(AtomicBool::new(true));
        let left_inbox = Inbox::new();
        let right_inbox = Inbox::new();
        let left_handle = ReplyHandle::allocate();
        let right_handle = ReplyHandle::allocate();

        let left = Self {
            handle: left_handle,
            peer_handle: right_handle,
            bound: Arc::clone(&bound),
            to_peer: right_inbox.sender(),
            inbox: left_inbox,
        };
        let right = Self {
            handle: right_handle,
            peer_handle: left_handle,
            bound,
            to_peer: left.inbox.sender(),
            inbox: right_inbox,
        };
        debug!(
            target: TRANSPORT_TARGET,
            left = %left_handle,
            right = %right_handle,
            "created local channel pair"
        );
        (left, right)
    }

    /// The address of the other end.
    #[must_use]
    pub const fn peer_handle(&self) -> ReplyHandle {
        self.peer_handle
    }
}

impl Channel for LocalChannel {
    fn send(&self, message: WireMessage) -> Result<(), TransportError> {
        if !self.is_bound() {
            return Err(TransportError::Closed);
        }

        let stamped = if message.is_request() && message.reply_handle().is_none() {
            message.with_reply_handle(Some(self.handle))
        } else {
            message
        };
        if let Some(handle) = stamped
            .reply_handle()
            .filter(|handle| stamped.is_response() && *handle != self.peer_handle)
        {
            return Err(TransportError::UnknownReplyTarget { handle });
        }

        self.to_peer
            .send(ChannelEvent::Message(stamped))
            .map_err(|_| TransportError::Closed)
    }

    fn on_receive(&self, handler: MessageHandler) {
        self.inbox.register(handler);
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    fn reply_handle(&self) -> ReplyHandle {
        self.handle
    }

    fn close(&self) {
        if !self.bound.swap(false, Ordering::AcqRel) {
            return;
        }
        info!(target: TRANSPORT_TARGET, handle = %self.handle, "local channel closed");
        notify_closed(&self.to_peer);
        notify_closed(&self.inbox.sender());
    }
}

impl Drop for LocalChannel {
    fn drop(&mut self) {
        self.close();
    }
}
