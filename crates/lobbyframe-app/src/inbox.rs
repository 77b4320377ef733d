//! Event inbox.
//!
//! Single producer (the transport thread), single consumer (the runtime).
//! Pushing never blocks; the runtime only looks at the inbox when it ticks.

use lobbyframe_proto::{EventRecord, Payload};
use tokio::sync::mpsc;

use crate::ChannelClosed;

/// Create a connected sender/inbox pair.
pub fn event_channel() -> (EventSender, EventInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventInbox { rx })
}

/// Transport-side handle. Not `Clone`: there is exactly one producer.
#[derive(Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<EventRecord>,
}

impl EventSender {
    /// Queue one event.
    ///
    /// # Errors
    ///
    /// `ChannelClosed` once the runtime is gone.
    pub fn send(&self, name: impl Into<String>, payload: Payload) -> Result<(), ChannelClosed> {
        self.send_record(EventRecord::new(name, payload))
    }

    /// Queue a pre-built record.
    ///
    /// # Errors
    ///
    /// `ChannelClosed` once the runtime is gone.
    pub fn send_record(&self, record: EventRecord) -> Result<(), ChannelClosed> {
        self.tx.send(record).map_err(|_| ChannelClosed)
    }

    /// Whether the runtime has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runtime-side handle.
#[derive(Debug)]
pub struct EventInbox {
    rx: mpsc::UnboundedReceiver<EventRecord>,
}

impl EventInbox {
    /// Next queued event, without waiting.
    ///
    /// `Err(ChannelClosed)` once the sender is dropped and the queue is
    /// drained.
    pub fn try_next(&mut self) -> Result<Option<EventRecord>, ChannelClosed> {
        match self.rx.try_recv() {
            Ok(record) => Ok(Some(record)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(ChannelClosed),
        }
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
