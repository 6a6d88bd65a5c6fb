//! Controller bindings
//!
//! Maps `(controller number, controller value)` pairs to [`SemanticCommand`]s.
//! The default table matches the stock encoder controller firmware; a
//! different table can be supplied through the `bindings` section of the
//! configuration file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Highest 7-bit MIDI data value
const MAX_DATA: u8 = 127;

/// Relative encoder token for a clockwise step
pub const ENCODER_INCREASE: u8 = 1;
/// Relative encoder token for a counter-clockwise step
pub const ENCODER_DECREASE: u8 = 127;
/// Button value sent on press
pub const BUTTON_PRESSED: u8 = 127;
/// Button value sent on release
pub const BUTTON_RELEASED: u8 = 0;

/// One of the four rotary encoders (1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EncoderId(u8);

impl EncoderId {
    pub const ALL: [EncoderId; 4] = [EncoderId(1), EncoderId(2), EncoderId(3), EncoderId(4)];

    pub fn new(id: u8) -> Option<Self> {
        (1..=4).contains(&id).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position, handy for indexing parameter banks
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for EncoderId {
    type Error = BindingError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        EncoderId::new(id).ok_or(BindingError::EncoderOutOfRange(id))
    }
}

impl From<EncoderId> for u8 {
    fn from(id: EncoderId) -> u8 {
        id.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Dedicated (non-encoder) buttons on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedButton {
    Tracks,
    Plugins,
    CurrentTrackPlugins,
    Settings,
    Record,
    Play,
    Stop,
    /// Secondary-bank modifier; not bound in the default table
    Shift,
}

/// Application-level meaning of a controller event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SemanticCommand {
    Encoder { id: EncoderId, direction: Direction },
    EncoderButton { id: EncoderId, state: ButtonState },
    Button { name: NamedButton, state: ButtonState },
}

impl fmt::Display for SemanticCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticCommand::Encoder { id, direction } => {
                write!(f, "Encoder{} {:?}", id.get(), direction)
            }
            SemanticCommand::EncoderButton { id, state } => {
                write!(f, "Encoder{}Button {:?}", id.get(), state)
            }
            SemanticCommand::Button { name, state } => write!(f, "{:?}Button {:?}", name, state),
        }
    }
}

/// Value predicate of a binding: an exact value or an inclusive range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueMatch {
    Exact(u8),
    Range { min: u8, max: u8 },
}

impl ValueMatch {
    pub fn matches(&self, value: u8) -> bool {
        match *self {
            ValueMatch::Exact(v) => v == value,
            ValueMatch::Range { min, max } => (min..=max).contains(&value),
        }
    }

    fn bounds(&self) -> (u8, u8) {
        match *self {
            ValueMatch::Exact(v) => (v, v),
            ValueMatch::Range { min, max } => (min, max),
        }
    }

    fn overlaps(&self, other: &ValueMatch) -> bool {
        let (a_min, a_max) = self.bounds();
        let (b_min, b_max) = other.bounds();
        a_min <= b_max && b_min <= a_max
    }
}

impl fmt::Display for ValueMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueMatch::Exact(v) => write!(f, "{}", v),
            ValueMatch::Range { min, max } => write!(f, "{}..={}", min, max),
        }
    }
}

/// A single binding entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerBinding {
    pub cc: u8,
    pub value: ValueMatch,
    pub command: SemanticCommand,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("controller number {0} is outside 0-127")]
    ControllerOutOfRange(u8),
    #[error("value {value} for controller {cc} is outside 0-127")]
    ValueOutOfRange { cc: u8, value: u8 },
    #[error("empty value range {min}..={max} for controller {cc}")]
    EmptyRange { cc: u8, min: u8, max: u8 },
    #[error("encoder id {0} is outside 1-4")]
    EncoderOutOfRange(u8),
    #[error("controller {cc}: values {first} and {second} overlap")]
    Overlap { cc: u8, first: ValueMatch, second: ValueMatch },
}

/// Validated, immutable binding table indexed by controller number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    by_cc: BTreeMap<u8, Vec<(ValueMatch, SemanticCommand)>>,
}

impl BindingTable {
    /// Build a table from binding entries, rejecting invalid or ambiguous ones
    pub fn from_bindings(bindings: &[ControllerBinding]) -> Result<Self, BindingError> {
        let mut by_cc: BTreeMap<u8, Vec<(ValueMatch, SemanticCommand)>> = BTreeMap::new();

        for binding in bindings {
            let cc = binding.cc;
            if cc > MAX_DATA {
                return Err(BindingError::ControllerOutOfRange(cc));
            }

            let (min, max) = binding.value.bounds();
            for value in [min, max] {
                if value > MAX_DATA {
                    return Err(BindingError::ValueOutOfRange { cc, value });
                }
            }
            if min > max {
                return Err(BindingError::EmptyRange { cc, min, max });
            }

            let entries = by_cc.entry(cc).or_default();
            if let Some((existing, _)) = entries.iter().find(|(m, _)| m.overlaps(&binding.value)) {
                return Err(BindingError::Overlap {
                    cc,
                    first: *existing,
                    second: binding.value,
                });
            }
            entries.push((binding.value, binding.command));
        }

        Ok(Self { by_cc })
    }

    /// Command bound to `(cc, value)`, if any
    pub fn lookup(&self, cc: u8, value: u8) -> Option<SemanticCommand> {
        self.by_cc
            .get(&cc)?
            .iter()
            .find(|(matcher, _)| matcher.matches(value))
            .map(|(_, command)| *command)
    }

    /// All bindings, ordered by controller number
    pub fn iter(&self) -> impl Iterator<Item = ControllerBinding> + '_ {
        self.by_cc.iter().flat_map(|(&cc, entries)| {
            entries.iter().map(move |&(value, command)| ControllerBinding { cc, value, command })
        })
    }

    pub fn len(&self) -> usize {
        self.by_cc.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cc.is_empty()
    }
}

impl Default for BindingTable {
    /// The stock layout; every entry is exact and unique per controller
    fn default() -> Self {
        let mut by_cc: BTreeMap<u8, Vec<(ValueMatch, SemanticCommand)>> = BTreeMap::new();
        for binding in default_bindings() {
            by_cc.entry(binding.cc).or_default().push((binding.value, binding.command));
        }
        Self { by_cc }
    }
}

/// Encoder turns on CC 1-4, encoder pushes on CC 64-67
const ENCODER_CCS: [(u8, u8); 4] = [(1, 64), (2, 65), (3, 66), (4, 67)];

const BUTTON_CCS: [(u8, NamedButton); 7] = [
    (10, NamedButton::Tracks),
    (7, NamedButton::Plugins),
    (9, NamedButton::CurrentTrackPlugins),
    (5, NamedButton::Settings),
    (38, NamedButton::Record),
    (39, NamedButton::Play),
    (40, NamedButton::Stop),
];

/// Binding entries of the stock controller layout
pub fn default_bindings() -> Vec<ControllerBinding> {
    let mut bindings = Vec::with_capacity(ENCODER_CCS.len() * 4 + BUTTON_CCS.len() * 2);

    for (id, (turn_cc, push_cc)) in EncoderId::ALL.into_iter().zip(ENCODER_CCS) {
        bindings.push(ControllerBinding {
            cc: turn_cc,
            value: ValueMatch::Exact(ENCODER_INCREASE),
            command: SemanticCommand::Encoder { id, direction: Direction::Increase },
        });
        bindings.push(ControllerBinding {
            cc: turn_cc,
            value: ValueMatch::Exact(ENCODER_DECREASE),
            command: SemanticCommand::Encoder { id, direction: Direction::Decrease },
        });
        bindings.extend(button_pair(push_cc, |state| SemanticCommand::EncoderButton { id, state }));
    }

    for (cc, name) in BUTTON_CCS {
        bindings.extend(button_pair(cc, |state| SemanticCommand::Button { name, state }));
    }

    bindings
}

fn button_pair(cc: u8, command: impl Fn(ButtonState) -> SemanticCommand) -> [ControllerBinding; 2] {
    [
        ControllerBinding {
            cc,
            value: ValueMatch::Exact(BUTTON_PRESSED),
            command: command(ButtonState::Pressed),
        },
        ControllerBinding {
            cc,
            value: ValueMatch::Exact(BUTTON_RELEASED),
            command: command(ButtonState::Released),
        },
    ]
}
