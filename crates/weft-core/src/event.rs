#![forbid(unsafe_code)]

//! Canonical input data model.
//!
//! This module defines the value records produced by the decoding pipeline:
//! [`ParsedKey`] for keyboard input and [`MouseEvent`] for pointer input.
//! All records derive `Clone` and `PartialEq` for use in tests and pattern
//! matching.
//!
//! # Design Notes
//!
//! - Key identity is a canonical name string (`"a"`, `"return"`, `"f1"`, or a
//!   grapheme-cluster string for emoji), not an enum: coalesced emoji clusters
//!   and plain characters share one representation.
//! - `Modifiers` uses the Kitty keyboard protocol bit assignment, so the wire
//!   bitmask decodes into it directly.
//! - Mouse coordinates are 0-indexed (the terminal reports 1-indexed).
//! - `KeyEventKind` defaults to `Press`; only the Kitty path emits `Repeat`
//!   and `Release`.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys that can be held during a key or mouse event.
    ///
    /// Bit values follow the Kitty keyboard protocol encoding (value − 1 of
    /// the wire modifier field).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        /// No modifiers.
        const NONE      = 0;
        /// Shift key.
        const SHIFT     = 1;
        /// Alt/Option key.
        const ALT       = 2;
        /// Control key.
        const CTRL      = 4;
        /// Super/Command/Windows key.
        const SUPER     = 8;
        /// Hyper key (rare, Kitty only).
        const HYPER     = 16;
        /// Meta key as a distinct Kitty modifier (not Alt).
        const META      = 32;
        /// Caps Lock state.
        const CAPS_LOCK = 64;
        /// Num Lock state.
        const NUM_LOCK  = 128;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event, Kitty only).
    Repeat,

    /// Key was released (Kitty only).
    Release,
}

/// Which decoding path produced a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeySource {
    /// Legacy xterm/rxvt byte sequences.
    #[default]
    Raw,

    /// Kitty keyboard protocol (`CSI … u`).
    Kitty,
}

/// A decoded keyboard event.
///
/// Immutable value record from the producer's viewpoint: the framer and
/// parsers create it, the dispatcher consumes it synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    /// Canonical key identifier (`"a"`, `"return"`, `"up"`, `"f1"`, … or a
    /// grapheme-cluster string for coalesced emoji).
    pub name: String,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Canonical textual form of the key.
    pub sequence: String,

    /// The exact bytes that produced this event.
    pub raw: Vec<u8>,

    /// True when the key is an ASCII digit.
    pub is_number: bool,

    /// Press, repeat, or release.
    pub kind: KeyEventKind,

    /// Which decoding path produced the key.
    pub source: KeySource,

    /// Kitty primary codepoint, when available.
    pub code: Option<u32>,

    /// Kitty base-layout alternate codepoint, when available.
    pub base_code: Option<u32>,
}

impl ParsedKey {
    /// Create a key with the given name, no modifiers, and empty byte trail.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_number = name.len() == 1 && name.as_bytes()[0].is_ascii_digit();
        Self {
            sequence: name.clone(),
            raw: name.clone().into_bytes(),
            name,
            modifiers: Modifiers::NONE,
            is_number,
            kind: KeyEventKind::Press,
            source: KeySource::Raw,
            code: None,
            base_code: None,
        }
    }

    /// Attach modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Attach an event kind.
    #[must_use]
    pub fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check the canonical name.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// Check if Ctrl is held.
    #[must_use]
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt/Option is held.
    #[must_use]
    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift is held.
    #[must_use]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Super/Command is held.
    #[must_use]
    pub fn super_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SUPER)
    }

    /// Check if Hyper is held.
    #[must_use]
    pub fn hyper(&self) -> bool {
        self.modifiers.contains(Modifiers::HYPER)
    }
}

/// A decoded mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// The type of mouse event.
    pub kind: MouseEventKind,

    /// X coordinate (0-indexed, leftmost column is 0).
    pub x: u16,

    /// Y coordinate (0-indexed, topmost row is 0).
    pub y: u16,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new mouse event without modifiers.
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Attach modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Get the position as a tuple.
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// The type of mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed down.
    Down(MouseButton),

    /// Button released.
    Up(MouseButton),

    /// Pointer moved with no button reported.
    Moved,

    /// Wheel scrolled.
    Scroll(ScrollDirection),
}

/// Mouse button identifiers.
///
/// `None` is the SGR "no button" sentinel (button code 3), reported for pure
/// motion and for X10 releases, which do not name the released button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,

    /// Middle mouse button.
    Middle,

    /// Right mouse button.
    Right,

    /// No button (motion sentinel / unreported release).
    None,
}

impl MouseButton {
    /// Decode the low two bits of an SGR/X10 button code.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code & 0b11 {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            _ => Self::None,
        }
    }
}

/// Scroll wheel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Wheel up.
    Up,

    /// Wheel down.
    Down,

    /// Horizontal wheel left.
    Left,

    /// Horizontal wheel right.
    Right,
}
