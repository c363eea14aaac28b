//! Time and delay capabilities injected into the simulation.
//!
//! The numeric core only ever asks a [`Clock`] how much time has elapsed.
//! Blocking between cycles is the job of a [`Sleeper`], which only the
//! [`Runner`](crate::runner::Runner) uses.

use std::time::{Duration, Instant};

/// A monotonic, non-decreasing time source.
pub trait Clock {
    /// Time elapsed since the origin of this clock.
    fn elapsed(&self) -> Duration;

    /// Notify the clock that one nominal cycle of length `dt` has passed.
    ///
    /// Wall clocks ignore this.
    fn tick(&mut self, _dt: Duration) {}
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn tick(&mut self, dt: Duration) {
        (**self).tick(dt);
    }
}

/// Wall-clock time measured from construction with [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Start a clock at a previously captured instant.
    #[must_use]
    pub fn from_origin(origin: Instant) -> Self {
        Self { origin }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated time that only advances by the nominal cycle period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedClock {
    now: Duration,
}

impl SimulatedClock {
    /// A clock at `t = 0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock frozen at `now` until it is ticked.
    #[must_use]
    pub fn at(now: Duration) -> Self {
        Self { now }
    }
}

impl Clock for SimulatedClock {
    #[inline]
    fn elapsed(&self) -> Duration {
        self.now
    }

    fn tick(&mut self, dt: Duration) {
        self.now += dt;
    }
}

/// Selects which [`Clock`] drives the simulated ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TimeBase {
    /// Real elapsed time, so the sine wave follows actual loop timing.
    #[default]
    WallClock,
    /// Accumulated nominal `dt`, so runs are independent of scheduling jitter.
    Simulated,
}

/// A blocking delay between cycles.
pub trait Sleeper {
    /// Block for `period`.
    fn sleep(&mut self, period: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, period: Duration) {
        std::thread::sleep(period);
    }
}

/// Returns immediately, for running simulations as fast as possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Sleeper for NoDelay {
    fn sleep(&mut self, _period: Duration) {}
}
