//! Listener interface for semantic controller commands
//!
//! UI components implement [`CommandListener`] and override only the
//! notifications they care about; every method defaults to a no-op.
//! Methods take `&self`: listeners live on the UI context and keep their
//! mutable state in `Cell`/`RefCell`, which also lets a handler register or
//! unregister listeners while a broadcast is in flight.

use crate::bindings::{ButtonState, Direction, NamedButton, SemanticCommand};

#[allow(unused_variables)]
pub trait CommandListener {
    /// Raw passthrough, sent for every Control Change before any mapped command
    fn controller_event_received(&self, controller: u8, value: u8) {}

    fn encoder1_increased(&self) {}
    fn encoder1_decreased(&self) {}
    fn encoder2_increased(&self) {}
    fn encoder2_decreased(&self) {}
    fn encoder3_increased(&self) {}
    fn encoder3_decreased(&self) {}
    fn encoder4_increased(&self) {}
    fn encoder4_decreased(&self) {}

    fn encoder1_button_pressed(&self) {}
    fn encoder1_button_released(&self) {}
    fn encoder2_button_pressed(&self) {}
    fn encoder2_button_released(&self) {}
    fn encoder3_button_pressed(&self) {}
    fn encoder3_button_released(&self) {}
    fn encoder4_button_pressed(&self) {}
    fn encoder4_button_released(&self) {}

    fn tracks_button_pressed(&self) {}
    fn tracks_button_released(&self) {}
    fn plugins_button_pressed(&self) {}
    fn plugins_button_released(&self) {}
    fn current_track_plugins_button_pressed(&self) {}
    fn current_track_plugins_button_released(&self) {}
    fn settings_button_pressed(&self) {}
    fn settings_button_released(&self) {}
    fn record_button_pressed(&self) {}
    fn record_button_released(&self) {}
    fn play_button_pressed(&self) {}
    fn play_button_released(&self) {}
    fn stop_button_pressed(&self) {}
    fn stop_button_released(&self) {}
    fn shift_button_pressed(&self) {}
    fn shift_button_released(&self) {}
}

/// Invoke the single handler matching `command` on `listener`
pub fn notify(listener: &dyn CommandListener, command: SemanticCommand) {
    use ButtonState::{Pressed, Released};
    use Direction::{Decrease, Increase};

    match command {
        SemanticCommand::Encoder { id, direction } => match (id.get(), direction) {
            (1, Increase) => listener.encoder1_increased(),
            (1, Decrease) => listener.encoder1_decreased(),
            (2, Increase) => listener.encoder2_increased(),
            (2, Decrease) => listener.encoder2_decreased(),
            (3, Increase) => listener.encoder3_increased(),
            (3, Decrease) => listener.encoder3_decreased(),
            (4, Increase) => listener.encoder4_increased(),
            (4, Decrease) => listener.encoder4_decreased(),
            _ => unreachable!("EncoderId is always 1-4"),
        },
        SemanticCommand::EncoderButton { id, state } => match (id.get(), state) {
            (1, Pressed) => listener.encoder1_button_pressed(),
            (1, Released) => listener.encoder1_button_released(),
            (2, Pressed) => listener.encoder2_button_pressed(),
            (2, Released) => listener.encoder2_button_released(),
            (3, Pressed) => listener.encoder3_button_pressed(),
            (3, Released) => listener.encoder3_button_released(),
            (4, Pressed) => listener.encoder4_button_pressed(),
            (4, Released) => listener.encoder4_button_released(),
            _ => unreachable!("EncoderId is always 1-4"),
        },
        SemanticCommand::Button { name, state } => match (name, state) {
            (NamedButton::Tracks, Pressed) => listener.tracks_button_pressed(),
            (NamedButton::Tracks, Released) => listener.tracks_button_released(),
            (NamedButton::Plugins, Pressed) => listener.plugins_button_pressed(),
            (NamedButton::Plugins, Released) => listener.plugins_button_released(),
            (NamedButton::CurrentTrackPlugins, Pressed) => {
                listener.current_track_plugins_button_pressed()
            }
            (NamedButton::CurrentTrackPlugins, Released) => {
                listener.current_track_plugins_button_released()
            }
            (NamedButton::Settings, Pressed) => listener.settings_button_pressed(),
            (NamedButton::Settings, Released) => listener.settings_button_released(),
            (NamedButton::Record, Pressed) => listener.record_button_pressed(),
            (NamedButton::Record, Released) => listener.record_button_released(),
            (NamedButton::Play, Pressed) => listener.play_button_pressed(),
            (NamedButton::Play, Released) => listener.play_button_released(),
            (NamedButton::Stop, Pressed) => listener.stop_button_pressed(),
            (NamedButton::Stop, Released) => listener.stop_button_released(),
            (NamedButton::Shift, Pressed) => listener.shift_button_pressed(),
            (NamedButton::Shift, Released) => listener.shift_button_released(),
        },
    }
}
