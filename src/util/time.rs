//! Tick timing helpers
//!
//! Wall-clock time only paces the host loop. The simulation itself never
//! reads it.

use std::time::{Duration, Instant};

/// Ticks per second when `TICK_RATE` is not set
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Wall-clock length of one tick. A zero rate is treated as one.
pub fn tick_duration(tick_rate: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)))
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
