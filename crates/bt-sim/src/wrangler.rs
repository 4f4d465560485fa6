//! The `Wrangler` struct and its tick loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use bt_brain::{Brain, BrainStore};
use bt_core::{AgentHost, AgentId, BrainId, BtError, EventData, EventSource, SimClock, Tick, WranglerConfig};
use bt_schedule::{Membership, Registry, SleepRequest};
use bt_tree::TickContext;

use crate::{SimResult, TickReport, WranglerObserver};

// ── Wrangler ──────────────────────────────────────────────────────────────────

/// The tick scheduler.
///
/// `Wrangler<S>` owns every brain (in a [`BrainStore`]) and the three-way
/// [`Registry`] partition, and drives the per-tick loop:
///
/// 1. **Promote**: brains whose wake tick has arrived join the active set.
/// 2. **Update** (ascending `BrainId`): each active brain whose agent is valid
///    and awake runs one update.  A panicking update is caught, the tree is
///    forced to `Failed`, and the pass continues.
/// 3. **Re-file**: the brain's sleep time decides whether it stays active,
///    sleeps until a future tick, or hibernates.
///
/// Create via [`WranglerBuilder`][crate::WranglerBuilder].
pub struct Wrangler<S> {
    /// Tick length, run length, seed, snapshot cadence.
    pub config: WranglerConfig,

    /// Tracks the current tick and maps it to simulated time.
    pub clock: SimClock,

    pub(crate) brains:   BrainStore<S>,
    pub(crate) registry: Registry,
}

impl<S> Wrangler<S> {
    // ── Brains ────────────────────────────────────────────────────────────

    /// Store `brain`.  It is not scheduled until [`start`](Self::start).
    pub fn insert(&mut self, brain: Brain<S>) -> SimResult<BrainId> {
        Ok(self.brains.insert(brain)?)
    }

    /// Stop `id`, unregister it and take it out of storage.
    pub fn remove(&mut self, id: BrainId, source: &mut dyn EventSource) -> SimResult<Brain<S>> {
        let brain = self.brain_mut(id)?;
        if !brain.is_stopped() {
            brain.resume();
            brain.stop(source);
        }
        if self.registry.contains(id) {
            self.registry.remove(id)?;
        }
        let brain = self.brains.remove(id).ok_or(BtError::BrainNotFound(id))?;
        tracing::debug!(brain = %id, agent = %brain.agent(), "brain removed");
        Ok(brain)
    }

    pub fn brain(&self, id: BrainId) -> Option<&Brain<S>> {
        self.brains.get(id)
    }

    pub fn brain_mut(&mut self, id: BrainId) -> SimResult<&mut Brain<S>> {
        Ok(self.brains.get_mut(id).ok_or(BtError::BrainNotFound(id))?)
    }

    pub fn brain_of(&self, agent: AgentId) -> Option<BrainId> {
        self.brains.brain_of(agent)
    }

    pub fn brains(&self) -> &BrainStore<S> {
        &self.brains
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Start `id` and register it as active.  Returns `false` while the brain
    /// is paused.
    pub fn start(&mut self, id: BrainId, source: &mut dyn EventSource) -> SimResult<bool> {
        if !self.brain_mut(id)?.start(source) {
            return Ok(false);
        }
        if !self.registry.contains(id) {
            self.registry.insert(id)?;
        }
        Ok(true)
    }

    /// Start every stored brain.  Returns how many started.
    pub fn start_all(&mut self, source: &mut dyn EventSource) -> SimResult<usize> {
        let ids: Vec<BrainId> = self.brains.iter().map(|(id, _)| id).collect();
        let mut started = 0;
        for id in ids {
            if self.start(id, source)? {
                started += 1;
            }
        }
        Ok(started)
    }

    /// Stop `id` and unregister it.  Returns `false` while the brain is
    /// paused.
    pub fn stop(&mut self, id: BrainId, source: &mut dyn EventSource) -> SimResult<bool> {
        if !self.brain_mut(id)?.stop(source) {
            return Ok(false);
        }
        if self.registry.contains(id) {
            self.registry.remove(id)?;
        }
        Ok(true)
    }

    /// Take `id` out of scheduling, keeping its tree state.
    pub fn pause(&mut self, id: BrainId) -> SimResult<bool> {
        if !self.brain_mut(id)?.pause() {
            return Ok(false);
        }
        if self.registry.contains(id) {
            self.registry.remove(id)?;
        }
        tracing::debug!(brain = %id, "brain paused");
        Ok(true)
    }

    /// Put a paused brain back into the active set.  A brain that was
    /// stopped before pausing stays unregistered.
    pub fn resume(&mut self, id: BrainId) -> SimResult<bool> {
        let brain = self.brain_mut(id)?;
        if !brain.resume() {
            return Ok(false);
        }
        let stopped = brain.is_stopped();
        if !stopped && !self.registry.contains(id) {
            self.registry.insert(id)?;
        }
        tracing::debug!(brain = %id, "brain resumed");
        Ok(true)
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Invoke the handler `id` registered for `event`.  Returns whether one
    /// ran.
    pub fn push_event(&mut self, id: BrainId, event: &str, data: Option<&EventData>) -> SimResult<bool> {
        Ok(self.brain_mut(id)?.push_event(event, data))
    }

    /// Trigger the Event nodes of `id` listening for `event`.  When any
    /// fire, the brain is woken so it updates on the next tick.
    pub fn trigger_event(&mut self, id: BrainId, event: &str, data: Option<EventData>) -> SimResult<usize> {
        let triggered = self.brain_mut(id)?.trigger_event(event, data);
        if triggered > 0 {
            self.registry.wake(id);
        }
        Ok(triggered)
    }

    /// Route a host event to the brain thinking for `agent`.
    pub fn deliver_event(&mut self, agent: AgentId, event: &str, data: Option<EventData>) -> SimResult<usize> {
        let id = self.brains.brain_of(agent).ok_or(BtError::AgentNotFound(agent))?;
        self.trigger_event(id, event, data)
    }

    /// Make `id` due on the next tick regardless of its sleep time.
    pub fn force_update(&mut self, id: BrainId) -> SimResult<bool> {
        self.brain_mut(id)?.force_update();
        Ok(self.registry.wake(id))
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// Move `id` into the active set.  `false` if it is not registered.
    pub fn wake(&mut self, id: BrainId) -> bool {
        self.registry.wake(id)
    }

    pub fn hibernate(&mut self, id: BrainId) -> bool {
        self.registry.hibernate(id)
    }

    /// Sleep `id` for `duration` from the current tick.
    pub fn sleep(&mut self, id: BrainId, duration: Duration) -> bool {
        let request = SleepRequest::from_sleep_time(Some(duration), &self.clock);
        self.registry.refile(id, request, self.clock.current_tick)
    }

    pub fn membership(&self, id: BrainId) -> Option<Membership> {
        self.registry.membership(id)
    }

    /// Earliest tick with a scheduled brain.
    pub fn next_due(&self) -> Option<Tick> {
        self.registry.next_due()
    }

    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    pub fn run<H, O>(&mut self, host: &H, observer: &mut O) -> SimResult<()>
    where
        H: AgentHost + ?Sized,
        O: WranglerObserver<S>,
    {
        while self.clock.current_tick < self.config.end_tick() {
            self.step(host, observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<H, O>(&mut self, n: u64, host: &H, observer: &mut O) -> SimResult<()>
    where
        H: AgentHost + ?Sized,
        O: WranglerObserver<S>,
    {
        for _ in 0..n {
            self.step(host, observer)?;
        }
        Ok(())
    }

    /// Process the current tick, notify `observer`, and advance the clock.
    pub fn step<H, O>(&mut self, host: &H, observer: &mut O) -> SimResult<TickReport>
    where
        H: AgentHost + ?Sized,
        O: WranglerObserver<S>,
    {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        let report = self.process_tick(now, host, observer)?;
        observer.on_tick_end(&report);
        if self.config.is_snapshot_tick(now) {
            observer.on_snapshot(now, &self.brains, &self.registry);
        }
        self.clock.advance();
        Ok(report)
    }

    fn process_tick<H, O>(&mut self, now: Tick, host: &H, observer: &mut O) -> SimResult<TickReport>
    where
        H: AgentHost + ?Sized,
        O: WranglerObserver<S>,
    {
        let mut report = TickReport { tick: now, ..TickReport::default() };
        report.promoted = self.registry.promote(now).len();

        // Snapshot: updates re-file brains, which mutates the active set.
        let active: Vec<BrainId> = self.registry.active().collect();
        for id in active {
            let Some(brain) = self.brains.get_mut(id) else {
                continue;
            };
            let agent = brain.agent();
            if !host.is_valid(agent) || host.is_asleep(agent) {
                tracing::trace!(brain = %id, agent = %agent, "agent skipped");
                report.skipped += 1;
                continue;
            }

            let ctx = TickContext::from_clock(&self.clock, agent);
            match panic::catch_unwind(AssertUnwindSafe(|| brain.update(&ctx))) {
                Ok(status) => {
                    report.updated += 1;
                    tracing::trace!(brain = %id, ?status, "brain updated");
                }
                Err(payload) => {
                    let message = panic_message(&*payload);
                    tracing::error!(brain = %id, agent = %agent, tick = %now, %message, "brain update panicked");
                    brain.abort_cycle();
                    report.faulted += 1;
                    observer.on_brain_fault(now, id, agent, &message);
                }
            }

            let request = SleepRequest::from_sleep_time(brain.sleep_time(ctx.now), &self.clock);
            tracing::trace!(brain = %id, ?request, "brain re-filed");
            self.registry.refile(id, request, now);
        }

        report.active = self.registry.active_count();
        report.scheduled = self.registry.scheduled_count();
        report.hibernating = self.registry.hibernating_count();
        tracing::trace!(%report, "tick processed");
        Ok(report)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
