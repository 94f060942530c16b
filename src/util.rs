//! Small shared helpers.

use std::time::Instant;

/// Millisecond stopwatch for the pipeline stage timings.
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new stopwatch.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since the start (or the last reset).
    pub fn elapsed_millis(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Restart the stopwatch.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Read the elapsed milliseconds and restart in one step.
    pub fn get_and_reset(&mut self) -> f64 {
        let elapsed = self.elapsed_millis();
        self.reset();
        elapsed
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
