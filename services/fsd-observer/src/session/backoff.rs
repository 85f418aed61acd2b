//! Reconnect backoff

use std::time::Duration;

/// Doubling backoff measured in whole steps of `unit`
#[derive(Debug, Clone)]
pub struct Backoff {
    unit: Duration,
    current: u32,
    max_units: u32,
}

impl Backoff {
    pub fn new(unit: Duration, max_units: u32) -> Self {
        Self {
            unit,
            current: 1,
            max_units: max_units.max(1),
        }
    }

    /// Delay before the next attempt, advancing the counter
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.unit * self.current;
        self.current = self.current.saturating_mul(2).min(self.max_units);
        delay
    }

    /// Back to the minimum after a successful stream
    pub fn reset(&mut self) {
        self.current = 1;
    }

    /// Steps the next delay will last
    pub fn current_units(&self) -> u32 {
        self.current
    }
}
