#![forbid(unsafe_code)]

//! Scroll acceleration: velocity-weighted wheel multiplier.
//!
//! Rapid wheel ticks should cover more distance than slow deliberate ones.
//! The accelerator tracks the gaps between recent ticks and maps the
//! implied velocity onto an exponential ramp:
//!
//! ```text
//! v = 100 / avg_gap_ms
//! multiplier = min(max, 1 + gain · (e^(v/τ) − 1))
//! ```
//!
//! A pause longer than the streak timeout resets the ramp, so the first
//! tick of a new gesture always scrolls by exactly one step.
//!
//! Time is injected: [`ScrollAccelerator::tick`] takes `now`, keeping the
//! ramp deterministic in tests.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for scroll acceleration.
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    /// Ramp gain `A`. Default: 0.8.
    pub gain: f32,

    /// Ramp time constant `τ`. Default: 3.0.
    pub tau: f32,

    /// Upper bound on the multiplier. Default: 6.0.
    pub max_multiplier: f32,

    /// How many inter-tick gaps feed the velocity estimate. Default: 3.
    pub history_size: usize,

    /// A gap longer than this ends the streak. Default: 150ms.
    pub streak_timeout: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            gain: 0.8,
            tau: 3.0,
            max_multiplier: 6.0,
            history_size: 3,
            streak_timeout: Duration::from_millis(150),
        }
    }
}

// ---------------------------------------------------------------------------
// ScrollAccelerator
// ---------------------------------------------------------------------------

/// Velocity-weighted scroll multiplier with an exponential ramp.
#[derive(Debug, Default)]
pub struct ScrollAccelerator {
    config: ScrollConfig,
    /// Recent inter-tick gaps in milliseconds.
    history: VecDeque<f32>,
    last_tick: Option<Instant>,
}

impl ScrollAccelerator {
    /// Create an accelerator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ScrollConfig::default())
    }

    /// Create an accelerator with the given configuration.
    #[must_use]
    pub fn with_config(config: ScrollConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            last_tick: None,
        }
    }

    /// Register a wheel tick and return the multiplier to apply, always ≥ 1.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let Some(last) = self.last_tick.replace(now) else {
            return 1.0;
        };

        let gap = now.saturating_duration_since(last);
        if gap > self.config.streak_timeout {
            self.history.clear();
            return 1.0;
        }

        self.history.push_back(gap.as_secs_f32() * 1000.0);
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }

        let avg = self.history.iter().sum::<f32>() / self.history.len() as f32;
        if avg <= f32::EPSILON {
            return self.config.max_multiplier;
        }
        let velocity = 100.0 / avg;
        let ramp = 1.0 + self.config.gain * ((velocity / self.config.tau).exp() - 1.0);
        ramp.clamp(1.0, self.config.max_multiplier)
    }

    /// Clear the streak history.
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_tick = None;
    }
}
