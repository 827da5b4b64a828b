#![forbid(unsafe_code)]

//! Grapheme coalescing for the Kitty keyboard path.
//!
//! Terminals speaking the Kitty protocol report each codepoint of a
//! multi-codepoint emoji as a separate key event: a flag is two regional
//! indicators, a family emoji is person codepoints joined by ZWJ. This
//! module merges such runs back into single key events whose `name` is the
//! assembled grapheme cluster.
//!
//! # Design
//!
//! The coalescer buffers admissible codepoints and flushes on the first
//! non-coalescable event or on a short deadline (default 10ms). Flushing
//! runs the UAX #29 segmenter over the buffered codepoints and emits one
//! key per resulting cluster, so a greedy run of four regional indicators
//! still comes out as two flags.
//!
//! Time is injected (`push`/[`GraphemeCoalescer::poll`] take `now`); the
//! host arms a timer from [`GraphemeCoalescer::deadline`].
//!
//! # Failure Modes
//!
//! - If segmentation produces nothing for a non-empty buffer (degenerate
//!   input), each codepoint is emitted individually.
//! - `clear` drops buffered codepoints without emitting them.
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//! use weft_core::grapheme::GraphemeCoalescer;
//! use weft_core::keys::KeypressParser;
//!
//! let parser = KeypressParser::new().with_kitty(true);
//! let mut coalescer = GraphemeCoalescer::new();
//! let now = Instant::now();
//!
//! let ri_u = parser.parse(b"\x1b[127482u").unwrap();
//! let ri_s = parser.parse(b"\x1b[127480u").unwrap();
//! assert!(coalescer.push(ri_u, now).is_empty());
//! assert!(coalescer.push(ri_s, now).is_empty());
//!
//! let keys = coalescer.poll(coalescer.deadline().unwrap());
//! assert_eq!(keys.len(), 1);
//! assert_eq!(keys[0].name, "🇺🇸");
//! ```

use std::time::{Duration, Instant};

use unicode_segmentation::UnicodeSegmentation;

use crate::event::{KeyEventKind, KeySource, Modifiers, ParsedKey};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the grapheme coalescer.
#[derive(Debug, Clone)]
pub struct CoalescerConfig {
    /// How long to wait for a follow-up codepoint before flushing.
    /// Default: 10ms.
    pub timeout: Duration,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10),
        }
    }
}

// ---------------------------------------------------------------------------
// Codepoint classes
// ---------------------------------------------------------------------------

const ZWJ: char = '\u{200D}';

/// Can this codepoint start a grapheme cluster worth buffering?
fn can_start_cluster(c: char) -> bool {
    matches!(c,
        // Regional indicators (flag halves).
        '\u{1F1E6}'..='\u{1F1FF}'
        // Keycap bases.
        | '#' | '*' | '0'..='9'
        // Miscellaneous symbols and dingbats.
        | '\u{2600}'..='\u{27BF}'
        // Pictographs, transport, supplemental symbols.
        | '\u{1F300}'..='\u{1FAFF}'
    )
}

/// Can this codepoint extend a buffered cluster?
fn is_cluster_extender(c: char) -> bool {
    matches!(c,
        ZWJ
        // Variation selectors.
        | '\u{FE00}'..='\u{FE0F}'
        // Skin tone modifiers.
        | '\u{1F3FB}'..='\u{1F3FF}'
        // Regional indicators (flag pairs).
        | '\u{1F1E6}'..='\u{1F1FF}'
        // Combining enclosing keycap.
        | '\u{20E3}'
        // Tag characters (subdivision flags).
        | '\u{E0020}'..='\u{E007F}'
    )
}

// ---------------------------------------------------------------------------
// GraphemeCoalescer
// ---------------------------------------------------------------------------

/// Merges Kitty per-codepoint key events into grapheme-cluster keys.
#[derive(Debug, Default)]
pub struct GraphemeCoalescer {
    config: CoalescerConfig,
    /// Buffered codepoints with the bytes that produced each.
    buffer: Vec<(char, Vec<u8>)>,
    /// The first buffered key; supplies modifiers/kind/source on flush.
    template: Option<ParsedKey>,
    deadline: Option<Instant>,
}

impl GraphemeCoalescer {
    /// Create a coalescer with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CoalescerConfig::default())
    }

    /// Create a coalescer with the given configuration.
    #[must_use]
    pub fn with_config(config: CoalescerConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            template: None,
            deadline: None,
        }
    }

    /// The instant at which [`poll`](Self::poll) will flush, if a buffer is
    /// pending.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Feed one key event. Returns the keys ready for delivery, in order:
    /// any flushed clusters first, then the key itself if it was not
    /// buffered.
    pub fn push(&mut self, key: ParsedKey, now: Instant) -> Vec<ParsedKey> {
        match self.admissible(&key) {
            Some(c) => {
                self.buffer.push((c, key.raw.clone()));
                if self.template.is_none() {
                    self.template = Some(key);
                }
                self.deadline = Some(now + self.config.timeout);
                Vec::new()
            }
            None => {
                let mut out = self.flush();
                out.push(key);
                out
            }
        }
    }

    /// The codepoint under which this key joins the buffer, or `None`.
    fn admissible(&self, key: &ParsedKey) -> Option<char> {
        if key.source != KeySource::Kitty || key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.intersects(
            Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER | Modifiers::HYPER,
        ) {
            return None;
        }
        let c = key
            .code
            .and_then(char::from_u32)
            .or_else(|| single_char(&key.name))?;

        if self.buffer.is_empty() {
            can_start_cluster(c).then_some(c)
        } else if is_cluster_extender(c) || self.buffer.last().is_some_and(|(p, _)| *p == ZWJ) {
            Some(c)
        } else {
            None
        }
    }

    /// Flush the buffer if the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<ParsedKey> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Segment the buffered codepoints and emit one key per cluster.
    pub fn flush(&mut self) -> Vec<ParsedKey> {
        self.deadline = None;
        let buffered = std::mem::take(&mut self.buffer);
        let Some(template) = self.template.take() else {
            return Vec::new();
        };

        let assembled: String = buffered.iter().map(|(c, _)| c).collect();
        let clusters: Vec<&str> = assembled.graphemes(true).collect();
        if clusters.is_empty() {
            // Degenerate segmentation: emit each codepoint on its own.
            return buffered
                .into_iter()
                .map(|(c, raw)| cluster_key(&template, &c.to_string(), raw))
                .collect();
        }

        let mut parts = buffered.into_iter();
        clusters
            .iter()
            .map(|cluster| {
                let mut raw = Vec::new();
                for _ in 0..cluster.chars().count() {
                    if let Some((_, bytes)) = parts.next() {
                        raw.extend(bytes);
                    }
                }
                cluster_key(&template, cluster, raw)
            })
            .collect()
    }

    /// Cancel the deadline and drop any buffered codepoints.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.template = None;
        self.deadline = None;
    }
}

fn single_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn cluster_key(template: &ParsedKey, cluster: &str, raw: Vec<u8>) -> ParsedKey {
    ParsedKey {
        name: cluster.to_string(),
        modifiers: template.modifiers,
        sequence: cluster.to_string(),
        raw,
        is_number: cluster.len() == 1 && cluster.as_bytes()[0].is_ascii_digit(),
        kind: template.kind,
        source: template.source,
        // A multi-codepoint cluster has no single codepoint identity.
        code: None,
        base_code: None,
    }
}
