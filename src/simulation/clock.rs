//! Simulated time
//!
//! The clock only moves when the event loop consumes an event. It also
//! remembers when the time-weighted statistics were last brought up to date.

use crate::simulation::{SimulationError, SimulationResult};
use tracing::trace;

/// Current simulated time and last statistics update time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationClock {
    now: f64,
    last_update: f64,
}

impl SimulationClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Time at which the statistics were last integrated
    pub fn last_update(&self) -> f64 {
        self.last_update
    }

    /// Move the clock forward to an event time
    pub fn advance_to(&mut self, time: f64) -> SimulationResult<()> {
        if time < self.now || time.is_nan() {
            return Err(SimulationError::invariant_violation(format!(
                "clock cannot move backwards from {} to {}",
                self.now, time
            )));
        }
        trace!(from = self.now, to = time, "Advancing simulation clock");
        self.now = time;
        Ok(())
    }

    /// Interval not yet covered by the time-weighted statistics
    pub fn elapsed_since_update(&self) -> f64 {
        self.now - self.last_update
    }

    /// Record that the statistics now cover everything up to the current time
    pub fn mark_updated(&mut self) {
        self.last_update = self.now;
    }
}
