#![forbid(unsafe_code)]

//! Keybinding canonicalisation and lookup.
//!
//! A binding's identity is its canonical key: `"<name>:<c>:<s>:<m>:<S>"`
//! with each of ctrl/shift/alt/super collapsed to `0` or `1`. Only those
//! four modifiers participate in identity; lock state and other modifier
//! flags of a pressed key deliberately do not.
//!
//! [`merge`] lets user bindings overwrite defaults with identical canonical
//! keys; [`build_map`] builds the lookup table, additionally registering
//! alias-renamed entries (`enter → return` makes a binding named `enter`
//! reachable as `return` too, without removing the original).

use std::collections::HashMap;
use std::fmt;

use weft_core::event::ParsedKey;

/// A key chord bound to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding<A> {
    /// Canonical key name (`"a"`, `"return"`, `"f5"`, …).
    pub name: String,

    /// Requires Ctrl.
    pub ctrl: bool,

    /// Requires Shift.
    pub shift: bool,

    /// Requires Alt/Option.
    pub alt: bool,

    /// Requires Super/Command.
    pub super_key: bool,

    /// The bound action.
    pub action: A,
}

impl<A> KeyBinding<A> {
    /// Create an unmodified binding.
    pub fn new(name: impl Into<String>, action: A) -> Self {
        Self {
            name: name.into(),
            ctrl: false,
            shift: false,
            alt: false,
            super_key: false,
            action,
        }
    }

    /// Require Ctrl.
    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Require Shift.
    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Require Alt/Option.
    #[must_use]
    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Require Super/Command.
    #[must_use]
    pub fn with_super(mut self) -> Self {
        self.super_key = true;
        self
    }

    /// This binding's canonical key.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        canonical_key(&self.name, self.ctrl, self.shift, self.alt, self.super_key)
    }
}

/// Build a canonical key from its parts.
#[must_use]
pub fn canonical_key(name: &str, ctrl: bool, shift: bool, alt: bool, super_key: bool) -> String {
    format!(
        "{name}:{}:{}:{}:{}",
        u8::from(ctrl),
        u8::from(shift),
        u8::from(alt),
        u8::from(super_key)
    )
}

/// The canonical key a pressed key resolves to.
#[must_use]
pub fn canonical_key_of(key: &ParsedKey) -> String {
    canonical_key(&key.name, key.ctrl(), key.shift(), key.alt(), key.super_key())
}

/// Merge `custom` over `defaults`: identical canonical keys are overwritten
/// by the custom binding, first-insertion order is preserved.
pub fn merge<A: Clone>(defaults: &[KeyBinding<A>], custom: &[KeyBinding<A>]) -> Vec<KeyBinding<A>> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, KeyBinding<A>> = HashMap::new();
    for binding in defaults.iter().chain(custom) {
        let key = binding.canonical_key();
        if !by_key.contains_key(&key) {
            order.push(key.clone());
        }
        by_key.insert(key, binding.clone());
    }
    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

/// Build the lookup map. Each binding is inserted under its canonical key;
/// when an alias `(old, new)` matches the binding's name, the binding is
/// additionally inserted under the alias-renamed canonical key. Aliasing
/// never removes the original entry.
pub fn build_map<A: Clone>(
    bindings: &[KeyBinding<A>],
    aliases: &[(&str, &str)],
) -> HashMap<String, KeyBinding<A>> {
    let mut map = HashMap::new();
    for binding in bindings {
        map.insert(binding.canonical_key(), binding.clone());
        for (old, new) in aliases {
            if binding.name == *old {
                map.insert(
                    canonical_key(new, binding.ctrl, binding.shift, binding.alt, binding.super_key),
                    binding.clone(),
                );
            }
        }
    }
    map
}

/// Resolve a pressed key against the lookup map.
#[must_use]
pub fn lookup<'a, A>(
    map: &'a HashMap<String, KeyBinding<A>>,
    key: &ParsedKey,
) -> Option<&'a KeyBinding<A>> {
    map.get(&canonical_key_of(key))
}

// ---------------------------------------------------------------------------
// Chord strings
// ---------------------------------------------------------------------------

/// Error from parsing a chord string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseChordError {
    /// A modifier token was not recognised.
    UnknownModifier(String),

    /// The chord has no key name.
    EmptyKey,
}

impl fmt::Display for ParseChordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownModifier(token) => write!(f, "unknown modifier in chord: {token:?}"),
            Self::EmptyKey => write!(f, "chord has no key name"),
        }
    }
}

impl std::error::Error for ParseChordError {}

/// Parse a chord string like `"ctrl+shift+p"` into a binding.
///
/// The final `+`-separated segment is the key name; earlier segments are
/// modifiers (`ctrl`/`control`, `shift`, `alt`/`option`/`meta`,
/// `super`/`cmd`), case-insensitive.
pub fn parse_chord<A>(chord: &str, action: A) -> Result<KeyBinding<A>, ParseChordError> {
    let mut segments: Vec<&str> = chord.split('+').collect();
    let name = segments
        .pop()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ParseChordError::EmptyKey)?;

    let mut binding = KeyBinding::new(name.to_ascii_lowercase(), action);
    for segment in segments {
        match segment.trim().to_ascii_lowercase().as_str() {
            "ctrl" | "control" => binding.ctrl = true,
            "shift" => binding.shift = true,
            "alt" | "option" | "meta" => binding.alt = true,
            "super" | "cmd" => binding.super_key = true,
            _ => return Err(ParseChordError::UnknownModifier(segment.trim().to_string())),
        }
    }
    Ok(binding)
}
