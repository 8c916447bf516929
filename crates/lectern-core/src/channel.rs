//! Transport channel between the control surface and the output surface.
//!
//! # Delivery contract
//!
//! - `send` delivers an envelope if and only if a receiver is attached at the
//!   moment of the call.  There is no acknowledgement, no retry, and no
//!   queueing while detached.
//! - Envelopes from one sender arrive in the order they were sent (FIFO).
//! - A receiver that goes away is the same as a detach: later sends are
//!   dropped, nothing errors.
//!
//! Sessions only depend on the [`Transport`] trait, so the in-process
//! [`TransportChannel`] below and a socket-backed bridge are interchangeable.
//!
//! # Inbound direction
//!
//! [`Transport`] is the control → output half.  The output surface answers
//! with [`SurfaceRequest`] envelopes on the same connection; a socket-backed
//! transport decodes them and hands them to its owner as events, and the
//! owning session decides what to do with each one.
//!
//! [`SurfaceRequest`]: crate::protocol::requests::SurfaceRequest

use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::protocol::messages::Envelope;
use crate::protocol::sequence::SequenceCounter;

/// Outbound half of a transport, as seen by a session.
pub trait Transport: Send + Sync {
    /// Fire-and-forget send.  Dropped silently when nothing is attached.
    fn send(&self, envelope: Envelope);

    /// Whether a receiver is attached right now.
    fn is_attached(&self) -> bool;
}

/// One delivered envelope with its per-attachment sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub seq: u64,
    pub envelope: Envelope,
}

/// Receiving end handed out by [`TransportChannel::attach`].
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl Inbox {
    /// Waits for the next frame.  Returns `None` once the channel has been
    /// detached and every frame already sent has been drained.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Returns a frame if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    /// Calls `handler` once per envelope, in arrival order, until the channel
    /// is detached.  Each call runs to completion before the next envelope is
    /// taken, so handlers never interleave.
    pub async fn on_message<F>(mut self, mut handler: F)
    where
        F: FnMut(Envelope),
    {
        while let Some(frame) = self.rx.recv().await {
            handler(frame.envelope);
        }
    }
}

/// In-process transport backed by an unbounded tokio channel.
///
/// # Examples
///
/// ```rust
/// use lectern_core::channel::{Transport, TransportChannel};
/// use lectern_core::protocol::messages::{Envelope, MessageType};
///
/// let channel = TransportChannel::new();
/// channel.send(Envelope::new(MessageType::MediaClear, Default::default())); // dropped
///
/// let mut inbox = channel.attach();
/// channel.send(Envelope::new(MessageType::MediaClear, Default::default()));
/// assert_eq!(inbox.try_recv().map(|f| f.seq), Some(0));
/// assert!(inbox.try_recv().is_none());
/// ```
#[derive(Debug, Default)]
pub struct TransportChannel {
    tx: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    seq: SequenceCounter,
}

impl TransportChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new receiver, replacing (and detaching) any previous one.
    pub fn attach(&self) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut guard = self.sender();
        self.seq.reset();
        *guard = Some(tx);
        Inbox { rx }
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<Frame>>> {
        // A panic while holding the lock cannot leave the Option half-written.
        self.tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Detaches the current receiver.  Frames already sent stay readable.
    pub fn detach(&self) {
        let mut guard = self.sender();
        *guard = None;
    }
}

impl Transport for TransportChannel {
    fn send(&self, envelope: Envelope) {
        let mut guard = self.sender();
        let Some(tx) = guard.as_ref() else {
            tracing::trace!(message_type = %envelope.message_type, "no receiver attached; dropped");
            return;
        };
        let frame = Frame {
            seq: self.seq.next(),
            envelope,
        };
        if tx.send(frame).is_err() {
            tracing::debug!("receiver went away; detaching");
            *guard = None;
        }
    }

    fn is_attached(&self) -> bool {
        let guard = self.sender();
        guard.as_ref().map(|tx| !tx.is_closed()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::MessageType;
    use serde_json::{json, Map};

    fn zoom(level: f64) -> Envelope {
        let mut data = Map::new();
        data.insert("zoomLevel".into(), json!(level));
        Envelope::new(MessageType::MediaUpdateZoom, data)
    }

    #[test]
    fn test_send_while_detached_is_dropped() {
        // Arrange
        let channel = TransportChannel::new();

        // Act
        channel.send(zoom(1.0));
        channel.send(zoom(2.0));
        let mut inbox = channel.attach();

        // Assert
        assert!(channel.is_attached());
        assert!(inbox.try_recv().is_none());
    }

    #[test]
    fn test_frames_arrive_in_send_order() {
        // Arrange
        let channel = TransportChannel::new();
        let mut inbox = channel.attach();

        // Act
        for i in 0..50 {
            channel.send(zoom(i as f64));
        }

        // Assert
        for expected in 0..50u64 {
            let frame = inbox.try_recv().expect("frame must be queued");
            assert_eq!(frame.seq, expected);
            assert_eq!(frame.envelope, zoom(expected as f64));
        }
    }

    #[test]
    fn test_dropped_inbox_counts_as_detached() {
        let channel = TransportChannel::new();
        let inbox = channel.attach();
        assert!(channel.is_attached());

        drop(inbox);

        assert!(!channel.is_attached());
        channel.send(zoom(1.0)); // must not panic
    }

    #[test]
    fn test_reattach_replaces_receiver_and_restarts_numbering() {
        // Arrange
        let channel = TransportChannel::new();
        let mut first = channel.attach();
        channel.send(zoom(1.0));

        // Act
        let mut second = channel.attach();
        channel.send(zoom(2.0));

        // Assert
        assert_eq!(first.try_recv().map(|f| f.seq), Some(0));
        assert!(first.try_recv().is_none());
        let frame = second.try_recv().expect("second inbox gets new frames");
        assert_eq!(frame.seq, 0);
        assert_eq!(frame.envelope, zoom(2.0));
    }

    #[test]
    fn test_detach_keeps_already_sent_frames() {
        let channel = TransportChannel::new();
        let mut inbox = channel.attach();
        channel.send(zoom(3.0));

        channel.detach();
        channel.send(zoom(4.0));

        assert_eq!(inbox.try_recv().map(|f| f.envelope), Some(zoom(3.0)));
        assert!(inbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_on_message_runs_handler_per_envelope_until_detach() {
        // Arrange
        let channel = TransportChannel::new();
        let inbox = channel.attach();
        channel.send(zoom(1.0));
        channel.send(zoom(2.0));
        channel.detach();

        // Act
        let mut seen = Vec::new();
        inbox.on_message(|env| seen.push(env)).await;

        // Assert
        assert_eq!(seen, vec![zoom(1.0), zoom(2.0)]);
    }
}
