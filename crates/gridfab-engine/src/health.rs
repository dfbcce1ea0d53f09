//! Hit points.

use serde::{Deserialize, Serialize};

/// Current and maximum hit points. Zero or below is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Health {
    /// Full health. A non-positive maximum is clamped to 1.
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    /// Apply `amount` damage. Returns true when this leaves the holder dead.
    pub fn damage(&mut self, amount: i32) -> bool {
        self.current = self.current.saturating_sub(amount);
        self.is_dead()
    }

    /// Restore up to `amount`, never above the maximum. No effect once dead.
    pub fn heal(&mut self, amount: i32) {
        if !self.is_dead() {
            self.current = self.current.saturating_add(amount).min(self.max);
        }
    }
}
