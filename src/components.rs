//! Reference listeners
//!
//! Small UI-side consumers of the dispatcher:
//! - [`ConsoleListener`] logs every notification (used by the binary)
//! - [`ListNavigator`] is a focus-aware list driven by encoder 1
//! - [`ParameterBank`] steps plugin parameters with a shift-selected bank

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info};

use crate::bindings::EncoderId;
use crate::focus::{ComponentId, FocusTracker};
use crate::listener::CommandListener;

// =========================================================================
// ConsoleListener
// =========================================================================

/// Logs every notification it receives
#[derive(Debug, Default)]
pub struct ConsoleListener {
    notification_count: Cell<u64>,
}

impl ConsoleListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notification_count(&self) -> u64 {
        self.notification_count.get()
    }

    fn record(&self, notification: &str) {
        let count = self.notification_count.get() + 1;
        self.notification_count.set(count);
        info!("🎛️  #{} {}", count, notification);
    }
}

macro_rules! log_notifications {
    ($($method:ident),* $(,)?) => {
        $(fn $method(&self) { self.record(stringify!($method)); })*
    };
}

impl CommandListener for ConsoleListener {
    fn controller_event_received(&self, controller: u8, value: u8) {
        debug!("CC {} = {}", controller, value);
    }

    log_notifications!(
        encoder1_increased, encoder1_decreased,
        encoder2_increased, encoder2_decreased,
        encoder3_increased, encoder3_decreased,
        encoder4_increased, encoder4_decreased,
        encoder1_button_pressed, encoder1_button_released,
        encoder2_button_pressed, encoder2_button_released,
        encoder3_button_pressed, encoder3_button_released,
        encoder4_button_pressed, encoder4_button_released,
        tracks_button_pressed, tracks_button_released,
        plugins_button_pressed, plugins_button_released,
        current_track_plugins_button_pressed, current_track_plugins_button_released,
        settings_button_pressed, settings_button_released,
        record_button_pressed, record_button_released,
        play_button_pressed, play_button_released,
        stop_button_pressed, stop_button_released,
        shift_button_pressed, shift_button_released,
    );
}

// =========================================================================
// ListNavigator
// =========================================================================

/// Callback run when the focused list's selection is opened
pub type OpenCallback = Box<dyn Fn(&ListNavigator, usize)>;

/// A selectable list that reacts to encoder 1 only while focused.
///
/// Turning encoder 1 moves the selection; releasing its button opens the
/// selected item through the callback, which typically creates another
/// component and moves focus to it.
pub struct ListNavigator {
    id: ComponentId,
    focus: Rc<FocusTracker>,
    title: String,
    items: Vec<String>,
    selected: Cell<usize>,
    showing: Cell<bool>,
    on_open: RefCell<Option<OpenCallback>>,
}

impl ListNavigator {
    pub fn new(focus: Rc<FocusTracker>, title: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            id: focus.register_component(),
            focus,
            title: title.into(),
            items,
            selected: Cell::new(0),
            showing: Cell::new(true),
            on_open: RefCell::new(None),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn selected_index(&self) -> usize {
        self.selected.get()
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.items.get(self.selected.get()).map(String::as_str)
    }

    pub fn set_showing(&self, showing: bool) {
        self.showing.set(showing);
    }

    pub fn set_on_open(&self, callback: OpenCallback) {
        *self.on_open.borrow_mut() = Some(callback);
    }

    /// Take focus for this list
    pub fn grab_focus(&self) {
        self.focus.set_focused_component(Some(self.id));
    }

    fn accepts_input(&self) -> bool {
        self.showing.get() && self.focus.is_focused(self.id)
    }

    fn select(&self, index: usize) {
        if self.items.is_empty() {
            return;
        }
        let index = index.min(self.items.len() - 1);
        if index != self.selected.get() {
            debug!("{}: selected {}", self.title, index);
            self.selected.set(index);
        }
    }
}

impl CommandListener for ListNavigator {
    fn encoder1_increased(&self) {
        if self.accepts_input() {
            self.select(self.selected.get() + 1);
        }
    }

    fn encoder1_decreased(&self) {
        if self.accepts_input() {
            self.select(self.selected.get().saturating_sub(1));
        }
    }

    fn encoder1_button_released(&self) {
        if !self.accepts_input() || self.items.is_empty() {
            return;
        }
        // Out of the cell while it runs, so the callback may rebind itself
        let Some(callback) = self.on_open.borrow_mut().take() else {
            return;
        };
        callback(self, self.selected.get());

        let mut slot = self.on_open.borrow_mut();
        if slot.is_none() {
            *slot = Some(callback);
        }
    }
}

impl Drop for ListNavigator {
    fn drop(&mut self) {
        self.focus.release_component(self.id);
    }
}

// =========================================================================
// ParameterBank
// =========================================================================

/// Number of parameters addressed by one bank of encoders
const BANK_OFFSET: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub interval: f32,
}

impl Parameter {
    pub fn new(name: impl Into<String>, min: f32, max: f32, interval: f32) -> Self {
        Self { name: name.into(), value: min, min, max, interval }
    }

    fn step(&mut self, steps: f32) {
        self.value = (self.value + steps * self.interval).clamp(self.min, self.max);
    }
}

/// Plugin parameters driven by encoders 1-4.
///
/// Without shift the encoders address parameters 0-3; while shift is held
/// they address 8-11. The bank keeps its own shift flag, set and cleared by
/// shift button notifications.
#[derive(Debug, Default)]
pub struct ParameterBank {
    parameters: RefCell<Vec<Parameter>>,
    shift_down: Cell<bool>,
}

impl ParameterBank {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self {
            parameters: RefCell::new(parameters),
            shift_down: Cell::new(false),
        }
    }

    pub fn value(&self, index: usize) -> Option<f32> {
        self.parameters.borrow().get(index).map(|p| p.value)
    }

    pub fn is_shift_down(&self) -> bool {
        self.shift_down.get()
    }

    /// 0 for the primary bank, 1 for the secondary one (only with more than 8 parameters)
    pub fn visible_bank(&self) -> usize {
        usize::from(self.shift_down.get() && self.parameters.borrow().len() > BANK_OFFSET)
    }

    fn turn(&self, encoder: u8, steps: f32) {
        let Some(encoder) = EncoderId::new(encoder) else {
            return;
        };
        let offset = if self.shift_down.get() { BANK_OFFSET } else { 0 };
        let index = encoder.index() + offset;
        if let Some(parameter) = self.parameters.borrow_mut().get_mut(index) {
            parameter.step(steps);
            debug!("{} = {}", parameter.name, parameter.value);
        }
    }
}

impl CommandListener for ParameterBank {
    fn shift_button_pressed(&self) {
        self.shift_down.set(true);
    }

    fn shift_button_released(&self) {
        self.shift_down.set(false);
    }

    fn encoder1_increased(&self) {
        self.turn(1, 1.0);
    }

    fn encoder1_decreased(&self) {
        self.turn(1, -1.0);
    }

    fn encoder2_increased(&self) {
        self.turn(2, 1.0);
    }

    fn encoder2_decreased(&self) {
        self.turn(2, -1.0);
    }

    fn encoder3_increased(&self) {
        self.turn(3, 1.0);
    }

    fn encoder3_decreased(&self) {
        self.turn(3, -1.0);
    }

    fn encoder4_increased(&self) {
        self.turn(4, 1.0);
    }

    fn encoder4_decreased(&self) {
        self.turn(4, -1.0);
    }
}
