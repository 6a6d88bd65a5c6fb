//! MIDI message decoding and diagnostics
//!
//! Parses raw bytes coming from a controller into [`MidiMessage`], wraps them
//! into an immutable [`MidiEvent`] tagged with the source device, and offers
//! the two pure views the dispatcher needs: a structural [`Classification`]
//! and a human-readable [`describe`] string for logs.

use std::sync::Arc;
use std::time::Instant;

/// Controller number of the "all sound off" channel mode message
pub const CC_ALL_SOUND_OFF: u8 = 120;

/// Controller number of the "all notes off" channel mode message
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Decoded MIDI message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Polyphonic aftertouch: channel (0-15), note (0-127), pressure (0-127)
    Aftertouch { channel: u8, note: u8, pressure: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },

    /// Channel Pressure: channel (0-15), pressure (0-127)
    ChannelPressure { channel: u8, pressure: u8 },

    /// Pitch wheel: channel (0-15), value (0-16383, centre 8192)
    PitchWheel { channel: u8, value: u16 },

    /// System Exclusive payload without the F0/F7 framing
    SysEx { data: Vec<u8> },

    /// Meta event (status 0xFF followed by a type byte)
    Meta { kind: u8, data: Vec<u8> },

    /// Any other system common / realtime message, kept as its status byte
    System { status: u8 },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes.
    ///
    /// Returns `None` for empty input, running status (data byte first),
    /// truncated messages and undefined status bytes. A Note On with
    /// velocity 0 is reported as a Note Off.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        if status < 0x80 {
            return None;
        }

        if status >= 0xF0 {
            return Self::parse_system(status, rest);
        }

        let channel = status & 0x0F;
        let d1 = rest.first().map(|b| b & 0x7F);
        let d2 = rest.get(1).map(|b| b & 0x7F);

        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff { channel, note: d1?, velocity: d2? }),
            0x90 => {
                let (note, velocity) = (d1?, d2?);
                if velocity == 0 {
                    Some(MidiMessage::NoteOff { channel, note, velocity })
                } else {
                    Some(MidiMessage::NoteOn { channel, note, velocity })
                }
            }
            0xA0 => Some(MidiMessage::Aftertouch { channel, note: d1?, pressure: d2? }),
            0xB0 => Some(MidiMessage::ControlChange { channel, cc: d1?, value: d2? }),
            0xC0 => Some(MidiMessage::ProgramChange { channel, program: d1? }),
            0xD0 => Some(MidiMessage::ChannelPressure { channel, pressure: d1? }),
            0xE0 => {
                let lsb = d1? as u16;
                let msb = d2? as u16;
                Some(MidiMessage::PitchWheel { channel, value: (msb << 7) | lsb })
            }
            _ => None,
        }
    }

    fn parse_system(status: u8, rest: &[u8]) -> Option<Self> {
        match status {
            0xF0 => {
                let end = rest.iter().position(|&b| b == 0xF7)?;
                Some(MidiMessage::SysEx { data: rest[..end].to_vec() })
            }
            0xFF if !rest.is_empty() => Some(MidiMessage::Meta {
                kind: rest[0],
                data: rest[1..].to_vec(),
            }),
            0xF4 | 0xF5 | 0xF7 | 0xF9 | 0xFD => None,
            _ => Some(MidiMessage::System { status }),
        }
    }

    /// Encode the message back to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::Aftertouch { channel, note, pressure } => {
                vec![0xA0 | (channel & 0x0F), note & 0x7F, pressure & 0x7F]
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            MidiMessage::ChannelPressure { channel, pressure } => {
                vec![0xD0 | (channel & 0x0F), pressure & 0x7F]
            }
            MidiMessage::PitchWheel { channel, value } => {
                vec![0xE0 | (channel & 0x0F), (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
            }
            MidiMessage::SysEx { ref data } => {
                let mut bytes = Vec::with_capacity(data.len() + 2);
                bytes.push(0xF0);
                bytes.extend_from_slice(data);
                bytes.push(0xF7);
                bytes
            }
            MidiMessage::Meta { kind, ref data } => {
                let mut bytes = vec![0xFF, kind];
                bytes.extend_from_slice(data);
                bytes
            }
            MidiMessage::System { status } => vec![status],
        }
    }

    /// Channel (0-15) for channel voice messages, `None` otherwise
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::Aftertouch { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::ChannelPressure { channel, .. }
            | MidiMessage::PitchWheel { channel, .. } => Some(channel),
            _ => None,
        }
    }

    /// `(controller number, value)` when this is a Control Change
    pub fn controller(&self) -> Option<(u8, u8)> {
        match *self {
            MidiMessage::ControlChange { cc, value, .. } => Some((cc, value)),
            _ => None,
        }
    }
}

/// A single message received from a hardware device.
///
/// Built once on the driver thread and moved to the UI context; never mutated.
#[derive(Debug, Clone)]
pub struct MidiEvent {
    /// Decoded message, `None` when the bytes could not be parsed
    pub message: Option<MidiMessage>,
    /// Raw bytes as delivered by the driver
    pub raw: Vec<u8>,
    /// Display name of the device that produced the message
    pub source: Arc<str>,
    pub received_at: Instant,
}

impl MidiEvent {
    /// Copy `data` and decode it
    pub fn from_raw(source: Arc<str>, data: &[u8]) -> Self {
        Self {
            message: MidiMessage::parse(data),
            raw: data.to_vec(),
            source,
            received_at: Instant::now(),
        }
    }

    pub fn from_message(source: impl Into<Arc<str>>, message: MidiMessage) -> Self {
        Self {
            raw: message.encode(),
            message: Some(message),
            source: source.into(),
            received_at: Instant::now(),
        }
    }

    /// Shorthand for a Control Change on channel 1
    pub fn controller(source: impl Into<Arc<str>>, cc: u8, value: u8) -> Self {
        Self::from_message(source, MidiMessage::ControlChange { channel: 0, cc, value })
    }
}

/// Structural category of a MIDI event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    NoteOn,
    NoteOff,
    ProgramChange,
    PitchWheel,
    Aftertouch,
    ChannelPressure,
    AllNotesOff,
    AllSoundOff,
    Meta,
    Controller,
    Other,
}

/// Classify an event.
///
/// The channel mode messages "all notes off" and "all sound off" are
/// reported as such even though they travel as Control Change.
pub fn classify(event: &MidiEvent) -> Classification {
    let Some(message) = &event.message else {
        return Classification::Other;
    };

    match *message {
        MidiMessage::NoteOn { .. } => Classification::NoteOn,
        MidiMessage::NoteOff { .. } => Classification::NoteOff,
        MidiMessage::ProgramChange { .. } => Classification::ProgramChange,
        MidiMessage::PitchWheel { .. } => Classification::PitchWheel,
        MidiMessage::Aftertouch { .. } => Classification::Aftertouch,
        MidiMessage::ChannelPressure { .. } => Classification::ChannelPressure,
        MidiMessage::ControlChange { cc: CC_ALL_NOTES_OFF, .. } => Classification::AllNotesOff,
        MidiMessage::ControlChange { cc: CC_ALL_SOUND_OFF, .. } => Classification::AllSoundOff,
        MidiMessage::ControlChange { .. } => Classification::Controller,
        // 0xFF is a system reset on the wire but a meta event in files; both read as meta
        MidiMessage::Meta { .. } | MidiMessage::System { status: 0xFF } => Classification::Meta,
        MidiMessage::SysEx { .. } | MidiMessage::System { .. } => Classification::Other,
    }
}

/// Human-readable description of an event, for diagnostics only
pub fn describe(event: &MidiEvent) -> String {
    let Some(message) = &event.message else {
        return format_hex(&event.raw);
    };

    match (classify(event), message) {
        (Classification::NoteOn, MidiMessage::NoteOn { note, .. }) => {
            format!("Note on {}", note_name(*note))
        }
        (Classification::NoteOff, MidiMessage::NoteOff { note, .. }) => {
            format!("Note off {}", note_name(*note))
        }
        (Classification::ProgramChange, MidiMessage::ProgramChange { program, .. }) => {
            format!("Program change {}", program)
        }
        (Classification::PitchWheel, MidiMessage::PitchWheel { value, .. }) => {
            format!("Pitch wheel {}", value)
        }
        (Classification::Aftertouch, MidiMessage::Aftertouch { note, pressure, .. }) => {
            format!("After touch {}: {}", note_name(*note), pressure)
        }
        (Classification::ChannelPressure, MidiMessage::ChannelPressure { pressure, .. }) => {
            format!("Channel pressure {}", pressure)
        }
        (Classification::AllNotesOff, _) => "All notes off".to_string(),
        (Classification::AllSoundOff, _) => "All sound off".to_string(),
        (Classification::Meta, _) => "Meta event".to_string(),
        (Classification::Controller, MidiMessage::ControlChange { cc, value, .. }) => {
            format!("Controller [{}]: {}", cc, value)
        }
        _ => format_hex(&event.raw),
    }
}

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Note name with sharps and octave, middle C (60) being C3
pub fn note_name(note: u8) -> String {
    let octave = (note / 12) as i32 - 2;
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
