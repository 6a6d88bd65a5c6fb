//! Listener broadcast registry
//!
//! Keeps the live, registration-ordered set of [`CommandListener`]s and fans
//! commands out to them. Each broadcast iterates a snapshot taken when it
//! starts, so handlers may add or remove listeners (themselves included)
//! without affecting the delivery in progress.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::bindings::SemanticCommand;
use crate::listener::{notify, CommandListener};

/// Shared handle to a listener living on the UI context
pub type ListenerRef = Rc<dyn CommandListener>;

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RefCell<Vec<ListenerRef>>,
}

/// Listener identity is the address of the shared allocation
fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; registering the same listener twice is a no-op
    pub fn add(&self, listener: ListenerRef) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregister a listener; unknown listeners are ignored
    pub fn remove(&self, listener: &ListenerRef) {
        self.listeners
            .borrow_mut()
            .retain(|l| !same_listener(l, listener));
    }

    pub fn contains(&self, listener: &ListenerRef) -> bool {
        self.listeners.borrow().iter().any(|l| same_listener(l, listener))
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Deliver `command` to every listener registered when the call starts
    pub fn broadcast(&self, command: SemanticCommand) {
        let snapshot = self.snapshot();
        trace!("Broadcasting {} to {} listener(s)", command, snapshot.len());
        for listener in &snapshot {
            notify(listener.as_ref(), command);
        }
    }

    /// Deliver the raw controller passthrough notification
    pub fn broadcast_controller_event(&self, controller: u8, value: u8) {
        for listener in &self.snapshot() {
            listener.controller_event_received(controller, value);
        }
    }

    // The borrow must end before any handler runs so handlers can call add/remove.
    fn snapshot(&self) -> Vec<ListenerRef> {
        self.listeners.borrow().clone()
    }
}
