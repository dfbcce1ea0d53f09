//! Counter-backed gates used by timed attributes.
//!
//! Two flavors:
//! - [`ReadyCounter`] saturates: once it reaches the last position it keeps
//!   reporting ready until reset.
//! - [`CycleCounter`] wraps: it reports true exactly every `period` calls.

use serde::{Deserialize, Serialize};

/// A gate that becomes ready after `length - 1` calls to [`prepare`](Self::prepare).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyCounter {
    position: u32,
    length: u32,
}

impl ReadyCounter {
    /// Create a counter at position 0. A length of 0 is clamped to 1.
    pub fn new(length: u32) -> Self {
        Self {
            position: 0,
            length: length.max(1),
        }
    }

    /// Create a counter that starts out ready.
    pub fn ready(length: u32) -> Self {
        let mut counter = Self::new(length);
        counter.reset(true);
        counter
    }

    /// Advance one step (saturating at the last position) and report
    /// whether the gate is ready.
    pub fn prepare(&mut self) -> bool {
        if self.position + 1 < self.length {
            self.position += 1;
        }
        self.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.position == self.length - 1
    }

    /// Return to the start, or jump straight to ready when `immediate`.
    pub fn reset(&mut self, immediate: bool) {
        self.position = if immediate { self.length - 1 } else { 0 };
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn length(&self) -> u32 {
        self.length
    }
}

/// A wrapping counter that fires once every `period` ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCounter {
    position: u32,
    period: u32,
}

impl CycleCounter {
    /// Create a counter with the given period. A period of 0 is clamped to 1.
    pub fn new(period: u32) -> Self {
        Self {
            position: 0,
            period: period.max(1),
        }
    }

    /// Advance one step. Returns true exactly on every `period`-th call.
    pub fn tick(&mut self) -> bool {
        self.position = (self.position + 1) % self.period;
        self.position == 0
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Fraction of the cycle elapsed, in `[0, 1)`, for progress display.
    pub fn progress(&self) -> f32 {
        self.position as f32 / self.period as f32
    }
}
