//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  The
//! mapping to elapsed simulated time is held in `SimClock`:
//!
//!   time = tick * tick_duration
//!
//! Durations are `std::time::Duration` (integer nanoseconds), so the
//! conversion in both directions is exact: a `Wait` of two seconds on a
//! one-second tick resolves on exactly the second tick after it started.

use std::fmt;
use std::time::Duration;

use crate::{BtError, BtResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and elapsed simulated time.
///
/// `SimClock` is cheap to copy and holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How much simulated time one tick represents.
    pub tick_duration: Duration,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    /// Create a clock at tick 0 with the given resolution.
    pub fn new(tick_duration: Duration) -> Self {
        Self {
            tick_duration,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick.offset(1);
    }

    /// Elapsed simulated time at `tick`.
    #[inline]
    pub fn time_at(&self, tick: Tick) -> Duration {
        let nanos = self.tick_duration.as_nanos().saturating_mul(tick.0 as u128);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Elapsed simulated time at `current_tick`.
    #[inline]
    pub fn now(&self) -> Duration {
        self.time_at(self.current_tick)
    }

    /// How many ticks span `duration`? (rounds up: a sleeper is never late)
    ///
    /// Zero for a zero duration; at least one for any positive duration.
    pub fn ticks_for(&self, duration: Duration) -> u64 {
        if duration.is_zero() {
            return 0;
        }
        let tick_nanos = self.tick_duration.as_nanos().max(1);
        let ticks = duration.as_nanos().div_ceil(tick_nanos);
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (t={:.3}s)", self.current_tick, self.now().as_secs_f64())
    }
}

// ── WranglerConfig ────────────────────────────────────────────────────────────

/// Top-level scheduler configuration.
///
/// Typically loaded from a TOML/JSON file by the host application (enable the
/// `serde` feature) and passed to `WranglerBuilder`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WranglerConfig {
    /// Fixed length of one tick.  Must be non-zero.  Default: 1/30 s.
    pub tick_duration: Duration,

    /// Ticks processed by `Wrangler::run`.  `run_ticks` ignores it.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical runs.
    pub seed: u64,

    /// Call `on_snapshot` every N ticks.  0 disables snapshots.
    pub snapshot_interval_ticks: u64,
}

impl Default for WranglerConfig {
    fn default() -> Self {
        Self {
            tick_duration:           Duration::from_nanos(33_333_333),
            total_ticks:             0,
            seed:                    0,
            snapshot_interval_ticks: 0,
        }
    }
}

impl WranglerConfig {
    /// The tick at which `run` stops (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Reject configurations the scheduler cannot run with.
    pub fn validate(&self) -> BtResult<()> {
        if self.tick_duration.is_zero() {
            return Err(BtError::Config("tick_duration must be non-zero".into()));
        }
        Ok(())
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_duration)
    }

    /// `true` if `tick` is a snapshot tick under this configuration.
    #[inline]
    pub fn is_snapshot_tick(&self, tick: Tick) -> bool {
        self.snapshot_interval_ticks > 0 && tick.0 % self.snapshot_interval_ticks == 0
    }
}
