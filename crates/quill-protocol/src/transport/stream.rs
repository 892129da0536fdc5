//! Channel over a framed async byte stream, such as a child's stdio.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::framing::{read_frame, write_frame};
use super::{Channel, ChannelEvent, Inbox, MessageHandler, TRANSPORT_TARGET, notify_closed};
use crate::envelope::TransportEnvelope;
use crate::error::TransportError;
use crate::message::{ReplyHandle, WireMessage};

/// Reply targets learnt from inbound requests.
type PeerHandles = Arc<Mutex<HashSet<ReplyHandle>>>;

/// A channel exchanging JSON envelopes framed with `Content-Length`.
///
/// Two background tasks own the stream halves. End of input or an I/O
/// failure unbinds the channel and delivers [`ChannelEvent::Closed`].
pub struct StreamChannel {
    handle: ReplyHandle,
    bound: Arc<AtomicBool>,
    outgoing: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    peers: PeerHandles,
    inbox: Inbox,
    reader_task: JoinHandle<()>,
}

impl StreamChannel {
    /// Starts the reader and writer tasks. Must be called within a Tokio
    /// runtime.
    pub fn spawn<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let handle = ReplyHandle::allocate();
        let bound = Arc::new(AtomicBool::new(true));
        let peers = PeerHandles::default();
        let inbox = Inbox::new();
        let (outgoing, queue) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(writer, queue, Arc::clone(&bound), inbox.sender()));
        let reader_task = tokio::spawn(read_loop(
            reader,
            Arc::clone(&bound),
            Arc::clone(&peers),
            inbox.sender(),
        ));
        debug!(target: TRANSPORT_TARGET, %handle, "stream channel started");

        Self {
            handle,
            bound,
            outgoing: Mutex::new(Some(outgoing)),
            peers,
            inbox,
            reader_task,
        }
    }

    fn route_check(&self, message: &WireMessage) -> Result<(), TransportError> {
        let Some(handle) = message.reply_handle() else {
            return Ok(());
        };
        if !message.is_response() {
            return Ok(());
        }
        let known = self
            .peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&handle);
        if known {
            Ok(())
        } else {
            Err(TransportError::UnknownReplyTarget { handle })
        }
    }
}

impl Channel for StreamChannel {
    fn send(&self, message: WireMessage) -> Result<(), TransportError> {
        if !self.is_bound() {
            return Err(TransportError::Closed);
        }
        let stamped = if message.is_request() && message.reply_handle().is_none() {
            message.with_reply_handle(Some(self.handle))
        } else {
            message
        };
        self.route_check(&stamped)?;

        let bytes = stamped
            .to_envelope()
            .to_bytes()
            .map_err(|error| TransportError::Envelope {
                message: error.to_string(),
            })?;
        let guard = self.outgoing.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = guard.as_ref().ok_or(TransportError::Closed)?;
        sender.send(bytes).map_err(|_| TransportError::Closed)
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
        // Dropping the queue lets the writer flush what is pending and exit.
        self.outgoing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.reader_task.abort();
        if self.bound.swap(false, Ordering::AcqRel) {
            info!(target: TRANSPORT_TARGET, handle = %self.handle, "stream channel closed");
            notify_closed(&self.inbox.sender());
        }
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::UnboundedReceiver<Vec<u8>>,
    bound: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = queue.recv().await {
        if let Err(error) = write_frame(&mut writer, &bytes).await {
            warn!(target: TRANSPORT_TARGET, %error, "stream write failed");
            mark_closed(&bound, &events);
            return;
        }
    }
    if let Err(error) = writer.shutdown().await {
        debug!(target: TRANSPORT_TARGET, %error, "stream shutdown failed");
    }
}

async fn read_loop<R>(
    source: R,
    bound: Arc<AtomicBool>,
    peers: PeerHandles,
    events: mpsc::UnboundedSender<ChannelEvent>,
) where
    R: AsyncRead + Unpin,
{
    let _unbind_on_exit = ReaderExit {
        bound,
        events: events.clone(),
    };
    let mut reader = BufReader::new(source);
    loop {
        let bytes = match read_frame(&mut reader).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(error) => {
                warn!(target: TRANSPORT_TARGET, %error, "stream read failed");
                break;
            }
        };
        let envelope = match TransportEnvelope::from_bytes(&bytes) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(target: TRANSPORT_TARGET, %error, "dropping undecodable envelope");
                continue;
            }
        };
        let message = WireMessage::from_envelope(envelope);
        if let Some(handle) = message.reply_handle().filter(|_| message.is_request()) {
            peers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(handle);
        }
        if events.send(ChannelEvent::Message(message)).is_err() {
            return;
        }
    }
}

/// Unbinds the channel however the reader task ends, including a panic or
/// an abort.
struct ReaderExit {
    bound: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl Drop for ReaderExit {
    fn drop(&mut self) {
        mark_closed(&self.bound, &self.events);
    }
}

fn mark_closed(bound: &AtomicBool, events: &mpsc::UnboundedSender<ChannelEvent>) {
    if bound.swap(false, Ordering::AcqRel) {
        info!(target: TRANSPORT_TARGET, "stream peer disconnected");
        notify_closed(events);
    }
}
