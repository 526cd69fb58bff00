//! Time sources for the Ducks crates
//!
//! Everything that needs "now" goes through [`Clock`], so the audio scheduler can run
//! against the wall clock in the game and against a hand-driven clock in tests.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A monotonic time source. `now` is measured from an arbitrary, fixed origin.
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Convenience: `now` in fractional seconds
    fn now_secs(&self) -> f64 {
        self.now().as_secs_f64()
    }
}

/// Wall clock, measured from the moment it was created
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    current: Cell<Duration>,
}

impl ManualClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at the given offset
    pub fn starting_at(start: Duration) -> Self {
        Self {
            current: Cell::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, delta: Duration) {
        self.current.set(self.current.get() + delta);
    }

    /// Move the clock forward by fractional seconds
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs.max(0.0)));
    }

    /// Jump to an absolute time. Going backwards is allowed; it models a wall-clock change.
    pub fn set(&self, time: Duration) {
        self.current.set(time);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.current.get()
    }
}
