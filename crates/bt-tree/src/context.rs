//! Per-tick time snapshot passed to every node visit.

use std::time::Duration;

use bt_core::{AgentId, SimClock, Tick};

/// Read-only view of "now" for one brain's update.
///
/// Built once per brain per tick by the wrangler.  `now` is derived from the
/// tick counter, so every node in every tree sees the same, tick-aligned
/// time during one scheduler pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    /// Current simulation tick.
    pub tick: Tick,

    /// Simulated time elapsed at `tick`.
    pub now: Duration,

    /// Length of one tick.
    pub tick_duration: Duration,

    /// The agent whose brain is being updated.
    pub agent: AgentId,
}

impl TickContext {
    /// Build the context for `tick` on a clock with the given resolution.
    #[inline]
    pub fn new(tick: Tick, tick_duration: Duration, agent: AgentId) -> Self {
        let clock = SimClock { tick_duration, current_tick: tick };
        Self { tick, now: clock.now(), tick_duration, agent }
    }

    /// Build the context for the clock's current tick.
    #[inline]
    pub fn from_clock(clock: &SimClock, agent: AgentId) -> Self {
        Self::new(clock.current_tick, clock.tick_duration, agent)
    }
}
