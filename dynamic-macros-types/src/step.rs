//! Macro step encoding.
//!
//! A macro program is a byte stream of steps. Every step starts with a one
//! byte opcode ([`MacroStepKind`]), followed by a payload whose length is
//! fixed by the opcode. The two tap sequence steps are the exception: their
//! payload runs until a terminator element.

use heapless::Vec;
use strum::FromRepr;

use crate::key::Key;

/// Longest encoded form of a single, non-sequence step.
pub const MAX_STEP_LEN: usize = 3;

/// Step opcodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MacroStepKind {
    End = 0x00,
    Interval = 0x01,
    Wait = 0x02,
    KeyDown = 0x03,
    KeyUp = 0x04,
    Tap = 0x05,
    KeyCodeDown = 0x06,
    KeyCodeUp = 0x07,
    TapCode = 0x08,
    ExplicitReport = 0x09,
    ImplicitReport = 0x0A,
    SendReport = 0x0B,
    TapSequence = 0x0C,
    TapCodeSequence = 0x0D,
}

impl TryFrom<u8> for MacroStepKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // Return original value when there's an error
        Self::from_repr(value).ok_or(value)
    }
}

impl MacroStepKind {
    /// Number of payload bytes following the opcode.
    ///
    /// Returns `None` for tap sequences, whose length depends on their content.
    pub const fn payload_len(self) -> Option<usize> {
        match self {
            Self::End | Self::ExplicitReport | Self::ImplicitReport | Self::SendReport => Some(0),
            Self::Interval | Self::Wait | Self::KeyCodeDown | Self::KeyCodeUp | Self::TapCode => Some(1),
            Self::KeyDown | Self::KeyUp | Self::Tap => Some(2),
            Self::TapSequence | Self::TapCodeSequence => None,
        }
    }
}

/// How the elements of a tap sequence are encoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceEncoding {
    /// Two bytes per element (flags, keycode), terminated by `0x00 0x00`
    Explicit,
    /// One keycode byte per element, terminated by `0x00`
    Compact,
}

impl SequenceEncoding {
    pub const fn element_len(self) -> usize {
        match self {
            Self::Explicit => 2,
            Self::Compact => 1,
        }
    }
}

/// A decoded macro step.
///
/// Compact and explicit key steps decode to the same variant; the compact
/// form only exists to save space for keys without flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroStep {
    /// Terminates the macro
    End,
    /// Sets the delay in ms applied before every following key transition
    Interval(u8),
    /// Pauses playback for the given ms
    Wait(u8),
    KeyDown(Key),
    KeyUp(Key),
    Tap(Key),
    /// Report steps are accepted for compatibility and have no effect
    Report,
    /// Start of a tap sequence, the elements follow the opcode
    TapSequence(SequenceEncoding),
    /// Opcode that this engine doesn't understand
    Unknown(u8),
}

impl MacroStep {
    /// Serialize the step.
    ///
    /// Key steps use the compact form whenever the key carries no flags.
    /// For [`MacroStep::TapSequence`] only the opcode is written, the caller
    /// appends the elements and the terminator.
    pub fn encode(&self) -> Vec<u8, MAX_STEP_LEN> {
        let (buf, len) = match *self {
            MacroStep::End => ([MacroStepKind::End as u8, 0, 0], 1),
            MacroStep::Interval(ms) => ([MacroStepKind::Interval as u8, ms, 0], 2),
            MacroStep::Wait(ms) => ([MacroStepKind::Wait as u8, ms, 0], 2),
            MacroStep::KeyDown(key) => encode_key(MacroStepKind::KeyDown, MacroStepKind::KeyCodeDown, key),
            MacroStep::KeyUp(key) => encode_key(MacroStepKind::KeyUp, MacroStepKind::KeyCodeUp, key),
            MacroStep::Tap(key) => encode_key(MacroStepKind::Tap, MacroStepKind::TapCode, key),
            MacroStep::Report => ([MacroStepKind::SendReport as u8, 0, 0], 1),
            MacroStep::TapSequence(SequenceEncoding::Explicit) => ([MacroStepKind::TapSequence as u8, 0, 0], 1),
            MacroStep::TapSequence(SequenceEncoding::Compact) => ([MacroStepKind::TapCodeSequence as u8, 0, 0], 1),
            MacroStep::Unknown(op) => ([op, 0, 0], 1),
        };
        // len never exceeds MAX_STEP_LEN
        Vec::from_slice(&buf[..len]).unwrap_or_default()
    }
}

fn encode_key(explicit: MacroStepKind, compact: MacroStepKind, key: Key) -> ([u8; MAX_STEP_LEN], usize) {
    if key.is_plain() {
        ([compact as u8, key.code, 0], 2)
    } else {
        ([explicit as u8, key.flags.into_bits(), key.code], 3)
    }
}
