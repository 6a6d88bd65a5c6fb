//! MIDI Commander
//!
//! Turns hardware MIDI controller input into semantic UI commands:
//! driver thread → [`relay`] → [`dispatcher`] → [`mapper`] → [`registry`]
//! → listeners, which consult [`focus`] to decide whether to react.

pub mod bindings;
pub mod components;
pub mod config;
pub mod devices;
pub mod dispatcher;
pub mod focus;
pub mod listener;
pub mod mapper;
pub mod midi;
pub mod registry;
pub mod relay;

pub use bindings::{BindingTable, ControllerBinding, SemanticCommand};
pub use dispatcher::CommandDispatcher;
pub use focus::{ComponentId, FocusTracker};
pub use listener::CommandListener;
pub use midi::{classify, describe, Classification, MidiEvent, MidiMessage};
pub use registry::{ListenerRef, ListenerRegistry};
