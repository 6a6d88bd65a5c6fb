//! Command dispatcher - the UI-context end of the pipeline
//!
//! Receives relayed [`MidiEvent`]s one at a time, logs their description,
//! and for Control Change messages:
//! 1. broadcasts the raw `controller_event_received` passthrough
//! 2. maps `(cc, value)` to a [`SemanticCommand`] and broadcasts it
//!
//! The dispatcher, its registry and its focus tracker are `!Send`: they stay
//! on the task that owns them, which is what serializes every handler.

#[cfg(test)]
mod tests;

use std::future::Future;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::bindings::{BindingTable, SemanticCommand};
use crate::focus::FocusTracker;
use crate::mapper::CommandMapper;
use crate::midi::{describe, MidiEvent};
use crate::registry::{ListenerRef, ListenerRegistry};
use crate::relay::RelayReceiver;

pub struct CommandDispatcher {
    mapper: CommandMapper,
    listeners: Rc<ListenerRegistry>,
    focus: Rc<FocusTracker>,
}

impl CommandDispatcher {
    pub fn new(table: BindingTable) -> Self {
        Self {
            mapper: CommandMapper::new(table),
            listeners: Rc::new(ListenerRegistry::new()),
            focus: Rc::new(FocusTracker::new()),
        }
    }

    /// Shared registry, for components that (un)register themselves
    pub fn listeners(&self) -> Rc<ListenerRegistry> {
        self.listeners.clone()
    }

    /// Shared focus tracker
    pub fn focus(&self) -> Rc<FocusTracker> {
        self.focus.clone()
    }

    pub fn add_listener(&self, listener: ListenerRef) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &ListenerRef) {
        self.listeners.remove(listener);
    }

    /// Process one event on the UI context.
    ///
    /// Returns the mapped command, if any, after it has been broadcast.
    pub fn handle_event(&self, event: &MidiEvent) -> Option<SemanticCommand> {
        debug!("[{}] {}", event.source, describe(event));

        let (controller, value) = event.message.as_ref()?.controller()?;

        self.listeners.broadcast_controller_event(controller, value);

        let command = self.mapper.dispatch(controller, value)?;
        debug!("CC {} = {} -> {}", controller, value, command);
        self.listeners.broadcast(command);
        Some(command)
    }

    /// Drain the relay until it closes or `shutdown` resolves.
    ///
    /// Events still queued at shutdown are dropped.
    pub async fn run(&self, mut receiver: RelayReceiver, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut reported_drops = 0;

        info!("Command dispatcher running with {} binding(s)", self.mapper.table().len());

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping command dispatcher");
                    receiver.close();
                    break;
                }

                event = receiver.recv() => {
                    let Some(event) = event else {
                        info!("All MIDI sources closed, stopping command dispatcher");
                        break;
                    };

                    let dropped = receiver.dropped();
                    if dropped > reported_drops {
                        warn!(
                            "⚠️  Relay queue overflowed, {} event(s) dropped so far",
                            dropped
                        );
                        reported_drops = dropped;
                    }

                    self.handle_event(&event);
                }
            }
        }
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new(BindingTable::default())
    }
}
