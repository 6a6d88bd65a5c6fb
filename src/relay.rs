//! Cross-context relay
//!
//! Moves MIDI events from driver callback threads to the UI context. The
//! producer side copies the bytes into a [`MidiEvent`] and enqueues it with
//! `try_send` on a bounded channel: it never blocks and never grows memory
//! past the queue capacity. One queue serves every device, and each device
//! callback enqueues sequentially, so events from one device arrive in order.
//!
//! When the UI side has gone away the event is dropped silently. When the
//! queue is full the event is dropped and counted; the consumer reports the
//! count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::midi::MidiEvent;

/// Default queue depth between driver threads and the UI context
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Create a relay with room for `capacity` undelivered events
pub fn channel(capacity: usize) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        RelaySender { tx, dropped: dropped.clone() },
        RelayReceiver { rx, dropped },
    )
}

/// Producer half, cloned into every device callback
#[derive(Debug, Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<MidiEvent>,
    dropped: Arc<AtomicU64>,
}

impl RelaySender {
    /// Hand a message received on a driver thread over to the UI context.
    ///
    /// Returns `false` if the event was dropped (queue full or UI closed).
    pub fn on_hardware_message(&self, source: &Arc<str>, data: &[u8]) -> bool {
        self.post(MidiEvent::from_raw(source.clone(), data))
    }

    /// Enqueue an already built event
    pub fn post(&self, event: MidiEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Events lost to a full queue so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the UI context
#[derive(Debug)]
pub struct RelayReceiver {
    rx: mpsc::Receiver<MidiEvent>,
    dropped: Arc<AtomicU64>,
}

impl RelayReceiver {
    /// Next event; `None` once every sender is gone and the queue is drained
    pub async fn recv(&mut self) -> Option<MidiEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<MidiEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Stop accepting events; producers see the relay as shut down
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
