//! Focus tracking
//!
//! Exactly one component at a time "owns" the encoders and buttons. The
//! tracker hands out opaque [`ComponentId`]s instead of holding references to
//! components: once a component is released its id no longer resolves, so a
//! stale focus can never point at a dead component.
//!
//! Neither the registry nor the mapper filter on focus. Listeners that want
//! exclusivity compare their own id with [`FocusTracker::focused_component`].

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;

use tracing::debug;

/// Opaque identity of a focusable component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct FocusTracker {
    next_id: Cell<u64>,
    live: RefCell<HashSet<ComponentId>>,
    focused: Cell<Option<ComponentId>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh id for a component that may take focus
    pub fn register_component(&self) -> ComponentId {
        let id = ComponentId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.live.borrow_mut().insert(id);
        id
    }

    /// Retire an id; clears focus if that component held it
    pub fn release_component(&self, id: ComponentId) {
        self.live.borrow_mut().remove(&id);
        if self.focused.get() == Some(id) {
            debug!("Focused {} released, clearing focus", id);
            self.focused.set(None);
        }
    }

    /// Transfer focus; `None` clears it
    pub fn set_focused_component(&self, id: Option<ComponentId>) {
        if self.focused.get() != id {
            debug!("Focus moved from {:?} to {:?}", self.focused.get(), id);
        }
        self.focused.set(id);
    }

    /// Currently focused component, `None` if unset, cleared or released
    pub fn focused_component(&self) -> Option<ComponentId> {
        self.focused
            .get()
            .filter(|id| self.live.borrow().contains(id))
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.focused_component() == Some(id)
    }
}
