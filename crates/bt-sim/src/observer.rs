//! Wrangler observer trait for progress reporting and data collection.

use bt_brain::BrainStore;
use bt_core::{AgentId, BrainId, Tick};
use bt_schedule::Registry;

use crate::TickReport;

/// Callbacks invoked by [`Wrangler::step`][crate::Wrangler::step] and
/// [`Wrangler::run`][crate::Wrangler::run] at key points in the tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: fault counter
///
/// ```rust,ignore
/// struct Faults(usize);
///
/// impl<S> WranglerObserver<S> for Faults {
///     fn on_brain_fault(&mut self, _: Tick, _: BrainId, _: AgentId, _: &str) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait WranglerObserver<S> {
    /// Called at the very start of each tick, before promotion.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after every active brain has been updated and re-filed.
    fn on_tick_end(&mut self, _report: &TickReport) {}

    /// Called when a brain's update panicked.  The brain's tree has already
    /// been forced to `Failed` for the cycle.
    fn on_brain_fault(&mut self, _tick: Tick, _brain: BrainId, _agent: AgentId, _message: &str) {}

    /// Called at snapshot intervals (every `config.snapshot_interval_ticks`
    /// ticks) with read-only access to every brain and the registry.
    fn on_snapshot(&mut self, _tick: Tick, _brains: &BrainStore<S>, _registry: &Registry) {}

    /// Called once by `run` after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`WranglerObserver`] that does nothing.
pub struct NoopObserver;

impl<S> WranglerObserver<S> for NoopObserver {}
