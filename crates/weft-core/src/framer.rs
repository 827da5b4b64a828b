#![forbid(unsafe_code)]

//! Stream framer: byte stream → complete terminal sequences.
//!
//! Accumulates raw bytes from the terminal and peels off complete tokens:
//! single characters (honouring multi-byte UTF-8), CSI sequences, SGR and
//! legacy X10 mouse reports, OSC strings, SS3 sequences, and 2-byte
//! `ESC <char>` meta sequences. Ambiguous prefixes (a lone ESC, an
//! unterminated CSI) are held back and flushed after a timeout so that a
//! bare Escape key press is still delivered.
//!
//! # Design
//!
//! The framer is a front-of-buffer classifier: [`StreamFramer::push`]
//! appends bytes and repeatedly peels the longest complete token from the
//! front. Classification never rescans earlier prefixes, so cost is linear
//! in the bytes consumed.
//!
//! Time is injected: `push` and [`StreamFramer::poll`] take `now`, and the
//! host arms a single timer from [`StreamFramer::deadline`]. No wall clock
//! is read internally, which keeps timeout behaviour deterministic in tests.
//!
//! # Invariants
//!
//! 1. Emitted sequences concatenate back to the consumed input (no byte is
//!    lost or reordered).
//! 2. The holdback buffer is empty, an ESC-prefixed proper prefix of a
//!    completable sequence, or an incomplete trailing UTF-8 scalar.
//! 3. A deadline is armed iff the holdback buffer is non-empty.
//!
//! # Failure Modes
//!
//! - Malformed escape input is flushed as-is on timeout; the downstream
//!   parser rejects it and the event is dropped.
//! - An incomplete sequence longer than [`FramerConfig::max_sequence_len`]
//!   is flushed immediately, bounding memory on hostile input.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use weft_core::framer::StreamFramer;
//!
//! let mut framer = StreamFramer::new();
//! let now = Instant::now();
//!
//! // A complete arrow-key sequence is emitted in one piece.
//! assert_eq!(framer.push(b"\x1b[A", now), vec![b"\x1b[A".to_vec()]);
//!
//! // A lone ESC is held back until the timeout expires.
//! assert!(framer.push(b"\x1b", now).is_empty());
//! let deadline = framer.deadline().unwrap();
//! assert_eq!(framer.poll(deadline), vec![b"\x1b".to_vec()]);
//! ```

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the stream framer.
#[derive(Debug, Clone)]
pub struct FramerConfig {
    /// How long an ambiguous prefix is held before being flushed as-is.
    /// Default: 10ms.
    pub timeout: Duration,

    /// Length guard: an incomplete sequence that outgrows this is flushed
    /// immediately. Default: 4096 bytes.
    pub max_sequence_len: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10),
            max_sequence_len: 4096,
        }
    }
}

impl FramerConfig {
    /// Create a config with a custom holdback timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Outcome of classifying the front of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// The first `len` bytes form one complete sequence.
    Token(usize),
    /// The buffer is a proper prefix; more bytes may complete it.
    NeedMore,
}

/// Expected total length of a UTF-8 scalar from its lead byte, or `None`
/// for bytes that cannot begin a scalar.
const fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

const fn is_csi_final(byte: u8) -> bool {
    matches!(byte, 0x40..=0x7E)
}

/// `<digits;digits;digits` check for an SGR mouse payload (final byte
/// excluded).
fn sgr_params_ok(payload: &[u8]) -> bool {
    let Some(rest) = payload.strip_prefix(b"<") else {
        return false;
    };
    let mut groups = 0;
    for group in rest.split(|&b| b == b';') {
        if group.is_empty() || !group.iter().all(u8::is_ascii_digit) {
            return false;
        }
        groups += 1;
    }
    groups == 3
}

/// Classify the front of `buf` (which is never empty).
fn classify(buf: &[u8]) -> Scan {
    if buf[0] != 0x1B {
        // Plain character: minimal valid UTF-8 scalar, or one garbage byte.
        return match utf8_len(buf[0]) {
            None => Scan::Token(1),
            Some(need) if buf.len() < need => Scan::NeedMore,
            Some(need) => {
                if buf[1..need].iter().all(|b| matches!(b, 0x80..=0xBF)) {
                    Scan::Token(need)
                } else {
                    Scan::Token(1)
                }
            }
        };
    }

    if buf.len() == 1 {
        return Scan::NeedMore;
    }

    match buf[1] {
        b'[' => classify_csi(buf),
        b']' => classify_osc(buf),
        b'O' => {
            // SS3: ESC O <final>.
            if buf.len() >= 3 {
                Scan::Token(3)
            } else {
                Scan::NeedMore
            }
        }
        // Meta: ESC <char>, including ESC ESC.
        _ => Scan::Token(2),
    }
}

fn classify_csi(buf: &[u8]) -> Scan {
    if buf.len() == 2 {
        return Scan::NeedMore;
    }

    // Legacy X10 mouse: ESC [ M <cb> <cx> <cy>, six bytes total.
    if buf[2] == b'M' {
        return if buf.len() >= 6 {
            Scan::Token(6)
        } else {
            Scan::NeedMore
        };
    }

    for (i, &byte) in buf.iter().enumerate().skip(2) {
        if !is_csi_final(byte) {
            continue;
        }
        // An SGR mouse final is only accepted once the full
        // <digits;digits;digits shape is present.
        if (byte == b'M' || byte == b'm') && buf[2] == b'<' {
            return if sgr_params_ok(&buf[2..i]) {
                Scan::Token(i + 1)
            } else {
                Scan::NeedMore
            };
        }
        return Scan::Token(i + 1);
    }
    Scan::NeedMore
}

fn classify_osc(buf: &[u8]) -> Scan {
    // OSC terminates at BEL or ST (ESC \). The terminator is part of the
    // emitted sequence.
    let mut i = 2;
    while i < buf.len() {
        match buf[i] {
            0x07 => return Scan::Token(i + 1),
            0x1B => {
                if i + 1 >= buf.len() {
                    return Scan::NeedMore;
                }
                if buf[i + 1] == b'\\' {
                    return Scan::Token(i + 2);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Scan::NeedMore
}

// ---------------------------------------------------------------------------
// StreamFramer
// ---------------------------------------------------------------------------

/// Incremental framer for a terminal input byte stream.
///
/// See the module docs for the token grammar and timeout protocol.
#[derive(Debug)]
pub struct StreamFramer {
    config: FramerConfig,
    buffer: Vec<u8>,
    deadline: Option<Instant>,
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamFramer {
    /// Create a framer with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FramerConfig::default())
    }

    /// Create a framer with the given configuration.
    #[must_use]
    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            config,
            buffer: Vec::with_capacity(64),
            deadline: None,
        }
    }

    /// Bytes currently held back as an ambiguous prefix.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The instant at which [`poll`](Self::poll) will flush the holdback
    /// buffer, if one is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Append input bytes and return every complete sequence peeled from the
    /// front of the stream, in consumption order.
    ///
    /// Cancels any pending deadline before processing; re-arms it when an
    /// ambiguous prefix remains.
    ///
    /// Two special cases from the wire protocol:
    /// - empty input with an empty buffer emits a single empty sequence
    ///   (used by paste end markers);
    /// - a single byte above 0x7F with an empty buffer is 8-bit meta
    ///   compatibility and is rewritten to `ESC (byte - 0x80)`.
    pub fn push(&mut self, input: &[u8], now: Instant) -> Vec<Vec<u8>> {
        self.deadline = None;

        if input.is_empty() && self.buffer.is_empty() {
            return vec![Vec::new()];
        }

        if input.len() == 1 && input[0] > 0x7F && self.buffer.is_empty() {
            self.buffer.push(0x1B);
            self.buffer.push(input[0] - 0x80);
        } else {
            self.buffer.extend_from_slice(input);
        }

        let mut out = Vec::new();
        while !self.buffer.is_empty() {
            match classify(&self.buffer) {
                Scan::Token(len) => {
                    let rest = self.buffer.split_off(len);
                    out.push(std::mem::replace(&mut self.buffer, rest));
                }
                Scan::NeedMore => {
                    if self.buffer.len() > self.config.max_sequence_len {
                        tracing::trace!(
                            len = self.buffer.len(),
                            "incomplete sequence exceeded length guard, flushing"
                        );
                        out.push(std::mem::take(&mut self.buffer));
                    } else {
                        self.deadline = Some(now + self.config.timeout);
                    }
                    break;
                }
            }
        }
        out
    }

    /// Flush the holdback buffer if the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<Vec<u8>> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                tracing::trace!(len = self.buffer.len(), "holdback timeout, flushing as-is");
                self.flush()
            }
            _ => Vec::new(),
        }
    }

    /// Flush the holdback buffer unconditionally.
    pub fn flush(&mut self) -> Vec<Vec<u8>> {
        self.deadline = None;
        if self.buffer.is_empty() {
            Vec::new()
        } else {
            vec![std::mem::take(&mut self.buffer)]
        }
    }

    /// Cancel the pending deadline and drop any held bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn plain_characters_emit_immediately() {
        let mut framer = StreamFramer::new();
        let out = framer.push(b"abc", t0());
        assert_eq!(out, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert!(framer.buffer().is_empty());
    }

    #[test]
    fn multibyte_utf8_is_one_sequence() {
        let mut framer = StreamFramer::new();
        let out = framer.push("é🎉".as_bytes(), t0());
        assert_eq!(out, vec!["é".as_bytes().to_vec(), "🎉".as_bytes().to_vec()]);
    }

    #[test]
    fn split_utf8_scalar_reassembles() {
        let mut framer = StreamFramer::new();
        let bytes = "🎉".as_bytes();
        let now = t0();
        assert!(framer.push(&bytes[..2], now).is_empty());
        assert!(framer.deadline().is_some());
        let out = framer.push(&bytes[2..], now);
        assert_eq!(out, vec![bytes.to_vec()]);
    }

    #[test]
    fn complete_csi_emits_itself() {
        let mut framer = StreamFramer::new();
        assert_eq!(framer.push(b"\x1b[A", t0()), vec![b"\x1b[A".to_vec()]);
        assert!(framer.buffer().is_empty());
    }

    #[test]
    fn csi_with_params() {
        let mut framer = StreamFramer::new();
        assert_eq!(framer.push(b"\x1b[1;5H", t0()), vec![b"\x1b[1;5H".to_vec()]);
    }

    #[test]
    fn lone_esc_flushes_on_timeout() {
        let mut framer = StreamFramer::new();
        let now = t0();
        assert!(framer.push(b"\x1b", now).is_empty());
        let deadline = framer.deadline().expect("deadline armed");

        // Before the deadline nothing happens.
        assert!(framer.poll(now).is_empty());
        assert_eq!(framer.poll(deadline), vec![b"\x1b".to_vec()]);
        assert!(framer.buffer().is_empty());
        assert!(framer.deadline().is_none());
    }

    #[test]
    fn push_cancels_pending_deadline() {
        let mut framer = StreamFramer::new();
        let now = t0();
        framer.push(b"\x1b", now);
        let deadline = framer.deadline().expect("deadline armed");

        // The continuation arrives in time; the ESC must not be flushed.
        let out = framer.push(b"[B", now);
        assert_eq!(out, vec![b"\x1b[B".to_vec()]);
        assert!(framer.poll(deadline).is_empty());
    }

    #[test]
    fn sgr_mouse_split_across_pushes() {
        let mut framer = StreamFramer::new();
        let now = t0();
        assert!(framer.push(b"\x1b", now).is_empty());
        assert!(framer.push(b"[<0;11;6", now).is_empty());
        let out = framer.push(b"M", now);
        assert_eq!(out, vec![b"\x1b[<0;11;6M".to_vec()]);
    }

    #[test]
    fn sgr_mouse_release_final() {
        let mut framer = StreamFramer::new();
        let out = framer.push(b"\x1b[<35;20;5m", t0());
        assert_eq!(out, vec![b"\x1b[<35;20;5m".to_vec()]);
    }

    #[test]
    fn malformed_sgr_waits_for_timeout() {
        let mut framer = StreamFramer::new();
        let now = t0();
        // Two parameter groups only: the M final is not accepted.
        assert!(framer.push(b"\x1b[<1;2M", now).is_empty());
        let deadline = framer.deadline().expect("deadline armed");
        assert_eq!(framer.poll(deadline), vec![b"\x1b[<1;2M".to_vec()]);
    }

    #[test]
    fn x10_mouse_six_bytes() {
        let mut framer = StreamFramer::new();
        let now = t0();
        assert!(framer.push(b"\x1b[M", now).is_empty());
        assert!(framer.push(b" ", now).is_empty());
        let out = framer.push(b"!\"", now);
        assert_eq!(out, vec![b"\x1b[M !\"".to_vec()]);
    }

    #[test]
    fn osc_bel_terminated() {
        let mut framer = StreamFramer::new();
        let out = framer.push(b"\x1b]0;title\x07", t0());
        assert_eq!(out, vec![b"\x1b]0;title\x07".to_vec()]);
    }

    #[test]
    fn osc_st_terminated() {
        let mut framer = StreamFramer::new();
        let now = t0();
        assert!(framer.push(b"\x1b]52;c;aGk=", now).is_empty());
        assert!(framer.push(b"\x1b", now).is_empty());
        let out = framer.push(b"\\", now);
        assert_eq!(out, vec![b"\x1b]52;c;aGk=\x1b\\".to_vec()]);
    }

    #[test]
    fn ss3_three_bytes() {
        let mut framer = StreamFramer::new();
        let now = t0();
        assert!(framer.push(b"\x1bO", now).is_empty());
        assert_eq!(framer.push(b"P", now), vec![b"\x1bOP".to_vec()]);
    }

    #[test]
    fn meta_prefix_two_bytes() {
        let mut framer = StreamFramer::new();
        assert_eq!(framer.push(b"\x1ba", t0()), vec![b"\x1ba".to_vec()]);
    }

    #[test]
    fn esc_esc_is_one_token() {
        let mut framer = StreamFramer::new();
        assert_eq!(framer.push(b"\x1b\x1b", t0()), vec![b"\x1b\x1b".to_vec()]);
    }

    #[test]
    fn empty_input_empty_buffer_emits_empty_sequence() {
        let mut framer = StreamFramer::new();
        assert_eq!(framer.push(b"", t0()), vec![Vec::new()]);
    }

    #[test]
    fn empty_input_with_pending_buffer_emits_nothing() {
        let mut framer = StreamFramer::new();
        let now = t0();
        framer.push(b"\x1b[", now);
        assert!(framer.push(b"", now).is_empty());
    }

    #[test]
    fn eight_bit_meta_rewrite() {
        let mut framer = StreamFramer::new();
        // 0xE1 = 0x80 + 'a': legacy 8-bit meta for Alt+a.
        let out = framer.push(&[0xE1], t0());
        assert_eq!(out, vec![b"\x1ba".to_vec()]);
    }

    #[test]
    fn text_then_mouse_then_text() {
        let mut framer = StreamFramer::new();
        let now = t0();
        let mut out = framer.push(b"abc\x1b[<35;20;5m", now);
        out.extend(framer.push(b"def", now));
        assert_eq!(
            out,
            vec![
                b"a".to_vec(),
                b"b".to_vec(),
                b"c".to_vec(),
                b"\x1b[<35;20;5m".to_vec(),
                b"d".to_vec(),
                b"e".to_vec(),
                b"f".to_vec(),
            ]
        );
    }

    #[test]
    fn bracketed_paste_markers_are_plain_csi() {
        let mut framer = StreamFramer::new();
        let now = t0();
        assert_eq!(framer.push(b"\x1b[200~", now), vec![b"\x1b[200~".to_vec()]);
        assert_eq!(framer.push(b"\x1b[201~", now), vec![b"\x1b[201~".to_vec()]);
    }

    #[test]
    fn clear_cancels_everything() {
        let mut framer = StreamFramer::new();
        framer.push(b"\x1b[", t0());
        framer.clear();
        assert!(framer.buffer().is_empty());
        assert!(framer.deadline().is_none());
    }

    #[test]
    fn length_guard_flushes_runaway_sequence() {
        let mut framer = StreamFramer::with_config(FramerConfig {
            max_sequence_len: 32,
            ..Default::default()
        });
        let now = t0();
        let mut input = vec![0x1B, b'['];
        input.extend(std::iter::repeat_n(b'1', 64));
        let out = framer.push(&input, now);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], input);
        assert!(framer.buffer().is_empty());

        // Framer is functional again afterwards.
        assert_eq!(framer.push(b"\x1b[A", now), vec![b"\x1b[A".to_vec()]);
    }

    #[test]
    fn kitty_sequence_frames_whole() {
        let mut framer = StreamFramer::new();
        let out = framer.push(b"\x1b[127482u\x1b[127480u", t0());
        assert_eq!(
            out,
            vec![b"\x1b[127482u".to_vec(), b"\x1b[127480u".to_vec()]
        );
    }
}
