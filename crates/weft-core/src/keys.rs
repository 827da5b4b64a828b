#![forbid(unsafe_code)]

//! Keypress decoding: one framed sequence → [`ParsedKey`].
//!
//! Two modes. Raw mode is always on and understands the legacy xterm/rxvt
//! byte encodings (control bytes, CSI cursor and tilde sequences, SS3, and
//! `ESC <char>` meta prefixes). Kitty mode is opt-in and decodes the Kitty
//! keyboard protocol (`CSI code[:alts] ; mods[:event] ; text u`), which is
//! the only source of repeat and release events.
//!
//! Mouse tokens (SGR and X10) and bracketed-paste markers are not key
//! presses; the parser returns `None` for them and the mouse parser or the
//! host paste accumulator takes over.
//!
//! # Example
//!
//! ```
//! use weft_core::keys::KeypressParser;
//!
//! let parser = KeypressParser::new();
//! let key = parser.parse(b"\x1b[A").unwrap();
//! assert_eq!(key.name, "up");
//!
//! let kitty = KeypressParser::new().with_kitty(true);
//! let key = kitty.parse(b"\x1b[97;5u").unwrap();
//! assert_eq!(key.name, "a");
//! assert!(key.ctrl());
//! ```

use crate::event::{KeyEventKind, KeySource, Modifiers, ParsedKey};

/// Stateless decoder for framed key sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeypressParser {
    kitty_enabled: bool,
}

/// Decode a framed sequence with Kitty mode off.
#[must_use]
pub fn parse_key(raw: &[u8]) -> Option<ParsedKey> {
    KeypressParser::new().parse(raw)
}

impl KeypressParser {
    /// Create a parser with Kitty mode disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kitty_enabled: false,
        }
    }

    /// Enable or disable Kitty protocol decoding.
    #[must_use]
    pub fn with_kitty(mut self, enabled: bool) -> Self {
        self.kitty_enabled = enabled;
        self
    }

    /// Whether Kitty protocol decoding is enabled.
    #[must_use]
    pub fn kitty_enabled(&self) -> bool {
        self.kitty_enabled
    }

    /// Decode one framed sequence. Returns `None` for mouse tokens, paste
    /// markers, and anything unrecognised.
    #[must_use]
    pub fn parse(&self, raw: &[u8]) -> Option<ParsedKey> {
        if raw.is_empty() {
            return None;
        }
        if raw[0] == 0x1B && raw.len() > 1 {
            self.parse_escape(raw)
        } else {
            parse_plain(raw)
        }
    }

    fn parse_escape(&self, raw: &[u8]) -> Option<ParsedKey> {
        match raw[1] {
            b'[' => self.parse_csi(raw),
            b'O' if raw.len() == 3 => parse_ss3(raw),
            // ESC <char>: the same key with Alt. Covers ESC ESC.
            _ if raw.len() == 2 => {
                let inner = parse_plain(&raw[1..])?;
                Some(finish(
                    inner.name,
                    inner.modifiers | Modifiers::ALT,
                    raw,
                    inner.is_number,
                ))
            }
            _ => None,
        }
    }

    fn parse_csi(&self, raw: &[u8]) -> Option<ParsedKey> {
        let body = raw.get(2..)?;
        let (&final_byte, params) = body.split_last()?;

        // Mouse reports are decoded elsewhere.
        if body.first() == Some(&b'<') || body.first() == Some(&b'M') {
            return None;
        }

        match final_byte {
            b'u' if self.kitty_enabled => parse_kitty(params, raw),
            b'A' => Some(csi_key("up", params, raw)),
            b'B' => Some(csi_key("down", params, raw)),
            b'C' => Some(csi_key("right", params, raw)),
            b'D' => Some(csi_key("left", params, raw)),
            b'H' => Some(csi_key("home", params, raw)),
            b'F' => Some(csi_key("end", params, raw)),
            b'P' => Some(csi_key("f1", params, raw)),
            b'Q' => Some(csi_key("f2", params, raw)),
            b'R' => Some(csi_key("f3", params, raw)),
            b'S' => Some(csi_key("f4", params, raw)),
            // Back-tab.
            b'Z' => {
                let mods = xterm_modifiers(params) | Modifiers::SHIFT;
                Some(finish("tab", mods, raw, false))
            }
            // rxvt shifted arrows.
            b'a' => Some(finish("up", Modifiers::SHIFT, raw, false)),
            b'b' => Some(finish("down", Modifiers::SHIFT, raw, false)),
            b'c' => Some(finish("right", Modifiers::SHIFT, raw, false)),
            b'd' => Some(finish("left", Modifiers::SHIFT, raw, false)),
            b'~' => parse_csi_tilde(params, raw),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw-mode tables
// ---------------------------------------------------------------------------

fn finish(name: impl Into<String>, modifiers: Modifiers, raw: &[u8], is_number: bool) -> ParsedKey {
    ParsedKey {
        name: name.into(),
        modifiers,
        sequence: String::from_utf8_lossy(raw).into_owned(),
        raw: raw.to_vec(),
        is_number,
        kind: KeyEventKind::Press,
        source: KeySource::Raw,
        code: None,
        base_code: None,
    }
}

fn parse_plain(raw: &[u8]) -> Option<ParsedKey> {
    if raw.len() == 1 {
        let byte = raw[0];
        return Some(match byte {
            b'\r' => finish("return", Modifiers::NONE, raw, false),
            b'\n' => finish("linefeed", Modifiers::NONE, raw, false),
            b'\t' => finish("tab", Modifiers::NONE, raw, false),
            0x08 | 0x7F => finish("backspace", Modifiers::NONE, raw, false),
            b' ' => finish("space", Modifiers::NONE, raw, false),
            0x1B => finish("escape", Modifiers::NONE, raw, false),
            0x00 => finish("space", Modifiers::CTRL, raw, false),
            // Ctrl+letter encodes as the control byte 1..26.
            0x01..=0x1A => {
                let c = (byte - 1 + b'a') as char;
                finish(c.to_string(), Modifiers::CTRL, raw, false)
            }
            0x21..=0x7E => finish((byte as char).to_string(), Modifiers::NONE, raw, byte.is_ascii_digit()),
            _ => return None,
        });
    }

    // A single multi-byte UTF-8 scalar.
    let text = std::str::from_utf8(raw).ok()?;
    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(finish(c.to_string(), Modifiers::NONE, raw, false))
}

fn parse_ss3(raw: &[u8]) -> Option<ParsedKey> {
    let name = match raw[2] {
        b'P' => "f1",
        b'Q' => "f2",
        b'R' => "f3",
        b'S' => "f4",
        b'A' => "up",
        b'B' => "down",
        b'C' => "right",
        b'D' => "left",
        b'H' => "home",
        b'F' => "end",
        // rxvt Ctrl variants.
        b'a' => return Some(finish("up", Modifiers::CTRL, raw, false)),
        b'b' => return Some(finish("down", Modifiers::CTRL, raw, false)),
        b'c' => return Some(finish("right", Modifiers::CTRL, raw, false)),
        b'd' => return Some(finish("left", Modifiers::CTRL, raw, false)),
        _ => return None,
    };
    Some(finish(name, Modifiers::NONE, raw, false))
}

fn csi_key(name: &str, params: &[u8], raw: &[u8]) -> ParsedKey {
    finish(name, xterm_modifiers(params), raw, false)
}

/// Decode the second numeric CSI parameter as an xterm modifier value.
fn xterm_modifiers(params: &[u8]) -> Modifiers {
    let Ok(text) = std::str::from_utf8(params) else {
        return Modifiers::NONE;
    };
    let value: u16 = text
        .split(';')
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    Modifiers::from_bits_truncate(value.saturating_sub(1))
}

fn parse_csi_tilde(params: &[u8], raw: &[u8]) -> Option<ParsedKey> {
    let text = std::str::from_utf8(params).ok()?;
    let number: u32 = text.split(';').next()?.parse().ok()?;
    let mods = xterm_modifiers(params);

    let name = match number {
        1 | 7 => "home",
        2 => "insert",
        3 => "delete",
        4 | 8 => "end",
        5 => "pageup",
        6 => "pagedown",
        11 => "f1",
        12 => "f2",
        13 => "f3",
        14 => "f4",
        15 => "f5",
        17 => "f6",
        18 => "f7",
        19 => "f8",
        20 => "f9",
        21 => "f10",
        23 => "f11",
        24 => "f12",
        // Bracketed paste markers (200/201) land here and are not keys.
        _ => return None,
    };
    Some(finish(name, mods, raw, false))
}

// ---------------------------------------------------------------------------
// Kitty keyboard protocol
// ---------------------------------------------------------------------------

/// Functional-key names for the Kitty private-use codepoint block.
fn kitty_functional_name(code: u32) -> Option<&'static str> {
    Some(match code {
        9 => "tab",
        10 => "linefeed",
        13 => "return",
        27 => "escape",
        32 => "space",
        8 | 127 => "backspace",
        57_344 => "escape",
        57_345 => "return",
        57_346 => "tab",
        57_347 => "backspace",
        57_348 => "insert",
        57_349 => "delete",
        57_350 => "left",
        57_351 => "right",
        57_352 => "up",
        57_353 => "down",
        57_354 => "pageup",
        57_355 => "pagedown",
        57_356 => "home",
        57_357 => "end",
        _ => return None,
    })
}

const KITTY_F1: u32 = 57_364;
const KITTY_F24: u32 = 57_387;

/// Decode `CSI code[:shifted[:base]] ; mods[:event] ; text u`.
fn parse_kitty(params: &[u8], raw: &[u8]) -> Option<ParsedKey> {
    let text = std::str::from_utf8(params).ok()?;
    let mut sections = text.split(';');

    let mut code_fields = sections.next()?.split(':');
    let code: u32 = code_fields.next()?.parse().ok()?;
    let base_code: Option<u32> = code_fields.nth(1).and_then(|f| f.parse().ok());

    let (modifiers, kind) = match sections.next() {
        None | Some("") => (Modifiers::NONE, KeyEventKind::Press),
        Some(mod_section) => {
            let mut fields = mod_section.split(':');
            let value: u16 = fields.next().and_then(|f| f.parse().ok()).unwrap_or(1);
            let kind = match fields.next().and_then(|f| f.parse::<u8>().ok()) {
                Some(2) => KeyEventKind::Repeat,
                Some(3) => KeyEventKind::Release,
                _ => KeyEventKind::Press,
            };
            (Modifiers::from_bits_truncate(value.saturating_sub(1)), kind)
        }
    };

    // Associated text, when present, supplies the key identity.
    let text_name: Option<String> = sections.next().map(|s| {
        s.split(':')
            .filter_map(|f| f.parse::<u32>().ok())
            .filter_map(char::from_u32)
            .collect()
    });

    let name = match text_name.filter(|n| !n.is_empty()) {
        Some(n) => n,
        None => match kitty_functional_name(code) {
            Some(n) => n.to_string(),
            None if (KITTY_F1..=KITTY_F24).contains(&code) => {
                format!("f{}", code - KITTY_F1 + 1)
            }
            None => char::from_u32(code)?.to_string(),
        },
    };
    let is_number = name.len() == 1 && name.as_bytes()[0].is_ascii_digit();

    Some(ParsedKey {
        name,
        modifiers,
        sequence: String::from_utf8_lossy(raw).into_owned(),
        raw: raw.to_vec(),
        is_number,
        kind,
        source: KeySource::Kitty,
        code: Some(code),
        base_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Raw mode: plain and control bytes ───────────────────────────────

    #[test]
    fn printable_ascii() {
        let key = parse_key(b"a").unwrap();
        assert_eq!(key.name, "a");
        assert_eq!(key.sequence, "a");
        assert_eq!(key.raw, b"a");
        assert_eq!(key.kind, KeyEventKind::Press);
        assert_eq!(key.source, KeySource::Raw);
        assert!(!key.is_number);
    }

    #[test]
    fn digits_are_numbers() {
        let key = parse_key(b"5").unwrap();
        assert_eq!(key.name, "5");
        assert!(key.is_number);
    }

    #[test]
    fn control_names() {
        assert_eq!(parse_key(b"\r").unwrap().name, "return");
        assert_eq!(parse_key(b"\n").unwrap().name, "linefeed");
        assert_eq!(parse_key(b"\t").unwrap().name, "tab");
        assert_eq!(parse_key(&[0x7F]).unwrap().name, "backspace");
        assert_eq!(parse_key(&[0x08]).unwrap().name, "backspace");
        assert_eq!(parse_key(b" ").unwrap().name, "space");
        assert_eq!(parse_key(&[0x1B]).unwrap().name, "escape");
    }

    #[test]
    fn ctrl_letters() {
        let key = parse_key(&[0x01]).unwrap();
        assert_eq!(key.name, "a");
        assert!(key.ctrl());

        let key = parse_key(&[0x1A]).unwrap();
        assert_eq!(key.name, "z");
        assert!(key.ctrl());
    }

    #[test]
    fn utf8_character() {
        let key = parse_key("é".as_bytes()).unwrap();
        assert_eq!(key.name, "é");
        assert_eq!(key.raw, "é".as_bytes());
    }

    // ── Raw mode: escape sequences ──────────────────────────────────────

    #[test]
    fn csi_arrows() {
        assert_eq!(parse_key(b"\x1b[A").unwrap().name, "up");
        assert_eq!(parse_key(b"\x1b[B").unwrap().name, "down");
        assert_eq!(parse_key(b"\x1b[C").unwrap().name, "right");
        assert_eq!(parse_key(b"\x1b[D").unwrap().name, "left");
    }

    #[test]
    fn csi_home_end() {
        assert_eq!(parse_key(b"\x1b[H").unwrap().name, "home");
        assert_eq!(parse_key(b"\x1b[F").unwrap().name, "end");
    }

    #[test]
    fn csi_modifier_param() {
        let key = parse_key(b"\x1b[1;5A").unwrap();
        assert_eq!(key.name, "up");
        assert!(key.ctrl());
        assert!(!key.shift());

        let key = parse_key(b"\x1b[1;2C").unwrap();
        assert_eq!(key.name, "right");
        assert!(key.shift());

        // 6 = 1 + (shift|ctrl)
        let key = parse_key(b"\x1b[1;6C").unwrap();
        assert!(key.shift() && key.ctrl());
    }

    #[test]
    fn csi_tilde_navigation() {
        assert_eq!(parse_key(b"\x1b[2~").unwrap().name, "insert");
        assert_eq!(parse_key(b"\x1b[3~").unwrap().name, "delete");
        assert_eq!(parse_key(b"\x1b[5~").unwrap().name, "pageup");
        assert_eq!(parse_key(b"\x1b[6~").unwrap().name, "pagedown");
        assert_eq!(parse_key(b"\x1b[1~").unwrap().name, "home");
        assert_eq!(parse_key(b"\x1b[4~").unwrap().name, "end");
    }

    #[test]
    fn csi_tilde_function_keys() {
        assert_eq!(parse_key(b"\x1b[11~").unwrap().name, "f1");
        assert_eq!(parse_key(b"\x1b[15~").unwrap().name, "f5");
        assert_eq!(parse_key(b"\x1b[17~").unwrap().name, "f6");
        assert_eq!(parse_key(b"\x1b[24~").unwrap().name, "f12");
    }

    #[test]
    fn csi_tilde_with_modifiers() {
        let key = parse_key(b"\x1b[3;5~").unwrap();
        assert_eq!(key.name, "delete");
        assert!(key.ctrl());
    }

    #[test]
    fn back_tab() {
        let key = parse_key(b"\x1b[Z").unwrap();
        assert_eq!(key.name, "tab");
        assert!(key.shift());
    }

    #[test]
    fn ss3_function_keys() {
        assert_eq!(parse_key(b"\x1bOP").unwrap().name, "f1");
        assert_eq!(parse_key(b"\x1bOQ").unwrap().name, "f2");
        assert_eq!(parse_key(b"\x1bOR").unwrap().name, "f3");
        assert_eq!(parse_key(b"\x1bOS").unwrap().name, "f4");
    }

    #[test]
    fn ss3_arrows_and_rxvt_variants() {
        assert_eq!(parse_key(b"\x1bOA").unwrap().name, "up");
        assert_eq!(parse_key(b"\x1bOH").unwrap().name, "home");

        let key = parse_key(b"\x1bOa").unwrap();
        assert_eq!(key.name, "up");
        assert!(key.ctrl());
    }

    #[test]
    fn meta_prefix() {
        let key = parse_key(b"\x1ba").unwrap();
        assert_eq!(key.name, "a");
        assert!(key.alt());
        assert_eq!(key.raw, b"\x1ba");
    }

    #[test]
    fn double_escape_is_alt_escape() {
        let key = parse_key(b"\x1b\x1b").unwrap();
        assert_eq!(key.name, "escape");
        assert!(key.alt());
    }

    #[test]
    fn mouse_tokens_are_not_keys() {
        assert!(parse_key(b"\x1b[<0;10;20M").is_none());
        assert!(parse_key(b"\x1b[M !\"").is_none());
    }

    #[test]
    fn paste_markers_are_not_keys() {
        assert!(parse_key(b"\x1b[200~").is_none());
        assert!(parse_key(b"\x1b[201~").is_none());
    }

    #[test]
    fn empty_and_garbage() {
        assert!(parse_key(b"").is_none());
        assert!(parse_key(b"\x1b[9999~").is_none());
        assert!(parse_key(&[0xFF]).is_none());
    }

    // ── Kitty protocol ──────────────────────────────────────────────────

    #[test]
    fn kitty_disabled_by_default() {
        assert!(parse_key(b"\x1b[97u").is_none());
    }

    #[test]
    fn kitty_basic_char() {
        let parser = KeypressParser::new().with_kitty(true);
        let key = parser.parse(b"\x1b[97u").unwrap();
        assert_eq!(key.name, "a");
        assert_eq!(key.source, KeySource::Kitty);
        assert_eq!(key.code, Some(97));
        assert_eq!(key.kind, KeyEventKind::Press);
    }

    #[test]
    fn kitty_modifiers_and_event_type() {
        let parser = KeypressParser::new().with_kitty(true);

        // 5 = 1 + (shift|ctrl); event 2 = repeat.
        let key = parser.parse(b"\x1b[97;5:2u").unwrap();
        assert!(key.ctrl());
        assert!(key.shift());
        assert_eq!(key.kind, KeyEventKind::Repeat);

        let key = parser.parse(b"\x1b[97;1:3u").unwrap();
        assert_eq!(key.kind, KeyEventKind::Release);
    }

    #[test]
    fn kitty_extended_modifiers() {
        let parser = KeypressParser::new().with_kitty(true);
        // 1 + (super 8 | hyper 16) = 25.
        let key = parser.parse(b"\x1b[97;25u").unwrap();
        assert!(key.super_key());
        assert!(key.hyper());
    }

    #[test]
    fn kitty_functional_keys() {
        let parser = KeypressParser::new().with_kitty(true);
        assert_eq!(parser.parse(b"\x1b[13u").unwrap().name, "return");
        assert_eq!(parser.parse(b"\x1b[27u").unwrap().name, "escape");
        assert_eq!(parser.parse(b"\x1b[57352u").unwrap().name, "up");
        assert_eq!(parser.parse(b"\x1b[57364u").unwrap().name, "f1");
        assert_eq!(parser.parse(b"\x1b[57387u").unwrap().name, "f24");
    }

    #[test]
    fn kitty_base_layout_alternate() {
        let parser = KeypressParser::new().with_kitty(true);
        // Cyrillic а with base-layout 'a': 1072:1040:97.
        let key = parser.parse(b"\x1b[1072:1040:97u").unwrap();
        assert_eq!(key.name, "а");
        assert_eq!(key.code, Some(1072));
        assert_eq!(key.base_code, Some(97));
    }

    #[test]
    fn kitty_associated_text() {
        let parser = KeypressParser::new().with_kitty(true);
        // Shift+a producing "A" as associated text.
        let key = parser.parse(b"\x1b[97;2;65u").unwrap();
        assert_eq!(key.name, "A");
        assert!(key.shift());
    }

    #[test]
    fn kitty_emoji_codepoint() {
        let parser = KeypressParser::new().with_kitty(true);
        // Regional indicator U (127482).
        let key = parser.parse(b"\x1b[127482u").unwrap();
        assert_eq!(key.name, "🇺");
        assert_eq!(key.code, Some(127_482));
    }

    #[test]
    fn kitty_digit_is_number() {
        let parser = KeypressParser::new().with_kitty(true);
        let key = parser.parse(b"\x1b[53u").unwrap();
        assert_eq!(key.name, "5");
        assert!(key.is_number);
    }

    #[test]
    fn raw_equals_input() {
        let parser = KeypressParser::new().with_kitty(true);
        for seq in [&b"\x1b[97;5u"[..], b"\x1b[1;5A", b"\x1bOP", b"\x1bq"] {
            let key = parser.parse(seq).unwrap();
            assert_eq!(key.raw, seq);
        }
    }
}
