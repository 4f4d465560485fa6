//! Conversion of a tree's sleep time into a scheduling decision.

use std::time::Duration;

use bt_core::SimClock;

/// What the scheduler should do with a brain after updating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepRequest {
    /// Stay active and update again next tick.
    Now,
    /// Sleep for this many ticks (always at least one).
    Ticks(u64),
    /// No running node: sleep until explicitly woken.
    Hibernate,
}

impl SleepRequest {
    /// Map a tree sleep time onto the tick grid of `clock`.
    ///
    /// `None` hibernates, zero stays active, and any positive duration is
    /// rounded up to whole ticks (at least one) so a sleeper is never late.
    pub fn from_sleep_time(sleep: Option<Duration>, clock: &SimClock) -> Self {
        match sleep {
            None => SleepRequest::Hibernate,
            Some(d) if d.is_zero() => SleepRequest::Now,
            Some(d) => SleepRequest::Ticks(clock.ticks_for(d).max(1)),
        }
    }
}
