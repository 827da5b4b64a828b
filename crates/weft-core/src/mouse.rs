#![forbid(unsafe_code)]

//! Mouse report decoding: SGR and legacy X10 tokens → [`MouseEvent`].
//!
//! Both encodings pack the button, motion/scroll flags, and keyboard
//! modifiers into one button code:
//!
//! - bits 0–1: button (0 left, 1 middle, 2 right, 3 none)
//! - bit 2 (4): Shift, bit 3 (8): Alt, bit 4 (16): Ctrl
//! - bit 5 (32): motion, bit 6 (64): scroll
//!
//! The parser only matches a token that starts at offset 0 and reports how
//! many bytes it consumed, so a caller holding a mouse report followed by
//! more input in one read can keep going from the returned offset.

use crate::event::{Modifiers, MouseButton, MouseEvent, MouseEventKind, ScrollDirection};

/// Decode a mouse report at the start of `bytes`.
///
/// Returns the event and the exact number of bytes consumed, or `None`
/// when `bytes` does not begin with a complete SGR or X10 mouse token.
#[must_use]
pub fn parse_mouse_with_consumed(bytes: &[u8]) -> Option<(MouseEvent, usize)> {
    if bytes.starts_with(b"\x1b[<") {
        parse_sgr(bytes)
    } else if bytes.starts_with(b"\x1b[M") {
        parse_x10(bytes)
    } else {
        None
    }
}

/// Decode a mouse report, discarding the consumed length.
#[must_use]
pub fn parse_mouse(bytes: &[u8]) -> Option<MouseEvent> {
    parse_mouse_with_consumed(bytes).map(|(event, _)| event)
}

fn modifiers_from_code(code: u16) -> Modifiers {
    let mut mods = Modifiers::NONE;
    if code & 4 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if code & 8 != 0 {
        mods |= Modifiers::ALT;
    }
    if code & 16 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

const fn scroll_direction(code: u16) -> ScrollDirection {
    match code & 0b11 {
        0 => ScrollDirection::Up,
        1 => ScrollDirection::Down,
        2 => ScrollDirection::Left,
        _ => ScrollDirection::Right,
    }
}

/// SGR: `ESC [ < b ; x ; y (M|m)`.
fn parse_sgr(bytes: &[u8]) -> Option<(MouseEvent, usize)> {
    let final_at = bytes
        .iter()
        .position(|&b| b == b'M' || b == b'm')
        .filter(|&i| i > 3)?;
    let final_byte = bytes[final_at];

    let payload = std::str::from_utf8(&bytes[3..final_at]).ok()?;
    let mut parts = payload.split(';');
    let code: u16 = parts.next()?.parse().ok()?;
    let x: u16 = parts.next()?.parse().ok()?;
    let y: u16 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let button = MouseButton::from_code(code);
    let kind = if code & 64 != 0 {
        MouseEventKind::Scroll(scroll_direction(code))
    } else if final_byte == b'm' {
        MouseEventKind::Up(button)
    } else if code & 32 != 0 && button == MouseButton::None {
        MouseEventKind::Moved
    } else {
        MouseEventKind::Down(button)
    };

    let event = MouseEvent::new(kind, x.saturating_sub(1), y.saturating_sub(1))
        .with_modifiers(modifiers_from_code(code));
    Some((event, final_at + 1))
}

/// Legacy X10: `ESC [ M <cb> <cx> <cy>`, each offset by 32.
fn parse_x10(bytes: &[u8]) -> Option<(MouseEvent, usize)> {
    if bytes.len() < 6 {
        return None;
    }
    let code = u16::from(bytes[3].checked_sub(32)?);
    let x = u16::from(bytes[4].checked_sub(32)?);
    let y = u16::from(bytes[5].checked_sub(32)?);

    let button = MouseButton::from_code(code);
    let kind = if code & 64 != 0 {
        MouseEventKind::Scroll(scroll_direction(code))
    } else if code & 32 != 0 && button == MouseButton::None {
        MouseEventKind::Moved
    } else if button == MouseButton::None {
        // X10 reports release as button 3 without naming the button.
        MouseEventKind::Up(MouseButton::None)
    } else {
        MouseEventKind::Down(button)
    };

    let event = MouseEvent::new(kind, x.saturating_sub(1), y.saturating_sub(1))
        .with_modifiers(modifiers_from_code(code));
    Some((event, 6))
}
