#![forbid(unsafe_code)]

//! Weft public facade crate.
//!
//! # Role in Weft
//! This crate is the user-facing entry point for the ecosystem. It
//! re-exports the most commonly used types from the internal crates
//! (core/runtime/extras) so application code does not need to wire each
//! crate individually.
//!
//! # How it fits in the system
//! - Byte framing and key/mouse decoding: provided by `weft-core`
//! - Event dispatch, focus, and keybindings: provided by `weft-runtime`
//! - Viewport culling and table layout: provided by `weft-extras`
//! - This crate ties them together for application authors.
//!
//! If you only depend on one crate in your application, it should be
//! `weft`.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use weft::{EventBus, KeypressParser, StreamFramer};
//!
//! let mut framer = StreamFramer::new();
//! let parser = KeypressParser::new();
//! let bus = EventBus::new();
//! bus.add_global_key_listener(|event| {
//!     if event.key().is_named("escape") {
//!         event.stop_propagation();
//!     }
//! });
//!
//! for sequence in framer.push(b"abc\x1b[A", Instant::now()) {
//!     if let Some(key) = parser.parse(&sequence) {
//!         bus.emit_key(key);
//!     }
//! }
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use weft_core::event::{
    KeyEventKind, KeySource, Modifiers, MouseButton, MouseEvent, MouseEventKind, ParsedKey,
    ScrollDirection,
};
pub use weft_core::framer::{FramerConfig, StreamFramer};
pub use weft_core::grapheme::{CoalescerConfig, GraphemeCoalescer};
pub use weft_core::keys::{KeypressParser, parse_key};
pub use weft_core::mouse::{parse_mouse, parse_mouse_with_consumed};
pub use weft_core::scroll::{ScrollAccelerator, ScrollConfig};

// --- Runtime re-exports ----------------------------------------------------

pub use weft_runtime::bindings::{
    KeyBinding, ParseChordError, build_map, canonical_key, canonical_key_of, lookup, merge,
    parse_chord,
};
pub use weft_runtime::dispatch::{EventBus, KeyEvent, ListenerId, PasteEvent, strip_ansi};
pub use weft_runtime::focus::{FocusController, FocusTree, TreeWalker};

// --- Extras re-exports -----------------------------------------------------

#[cfg(feature = "extras")]
pub use weft_extras::table::{
    Alignment, MarkdownTable, ParseTableStyleError, TableOptions, TableSpan, TableStyle,
    detect_tables, parse_table, render_table,
};
#[cfg(feature = "extras")]
pub use weft_extras::viewport::{
    Cullable, CullerConfig, ScrollAxis, Viewport, objects_in_viewport,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for weft apps.
#[derive(Debug)]
pub enum Error {
    /// I/O failure while reading the input stream.
    Io(std::io::Error),
    /// Invalid configuration (chord strings, style names).
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Config(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ParseChordError> for Error {
    fn from(err: ParseChordError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(feature = "extras")]
impl From<ParseTableStyleError> for Error {
    fn from(err: ParseTableStyleError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Standard result type for weft APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

/// Convenience prelude for day-to-day use.
pub mod prelude {
    pub use crate::{
        Error, EventBus, FocusController, FocusTree, GraphemeCoalescer, KeyBinding, KeyEvent,
        KeyEventKind, KeySource, KeypressParser, Modifiers, MouseEvent, MouseEventKind,
        ParsedKey, PasteEvent, Result, ScrollAccelerator, StreamFramer,
    };
    #[cfg(feature = "extras")]
    pub use crate::{TableOptions, Viewport, objects_in_viewport, render_table};

    pub use crate::{core, runtime};
    #[cfg(feature = "extras")]
    pub use crate::extras;
}

pub use weft_core as core;
#[cfg(feature = "extras")]
pub use weft_extras as extras;
pub use weft_runtime as runtime;
