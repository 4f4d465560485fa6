//! `Registry`: the three-way partition of registered brains.
//!
//! Every registered brain is in exactly one of:
//!
//! - **active**: updated on every tick,
//! - **scheduled at T**: sitting in the [`WakeQueue`] bucket for tick T,
//! - **hibernating**: not bucketed, updated again only after an explicit
//!   wake.
//!
//! A membership index (`BrainId → Membership`) is the single source of truth;
//! the partition structures mirror it, and every transition goes through
//! `move_to`, which detaches from the old partition before attaching to the
//! new one.

use std::collections::BTreeSet;

use bt_core::{BrainId, Tick};

use crate::{ScheduleError, ScheduleResult, SleepRequest, WakeQueue};

#[cfg(feature = "fx-hash")]
type IndexMap<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type IndexMap<K, V> = std::collections::HashMap<K, V>;

/// Which partition a registered brain is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Membership {
    Active,
    Scheduled(Tick),
    Hibernating,
}

impl Membership {
    pub fn as_str(self) -> &'static str {
        match self {
            Membership::Active       => "active",
            Membership::Scheduled(_) => "scheduled",
            Membership::Hibernating  => "hibernating",
        }
    }
}

/// Registered brains partitioned into active / scheduled / hibernating.
#[derive(Default, Debug)]
pub struct Registry {
    members:     IndexMap<BrainId, Membership>,
    active:      BTreeSet<BrainId>,
    hibernating: BTreeSet<BrainId>,
    queue:       WakeQueue,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register `brain` as active.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::AlreadyRegistered`] if it is registered already.
    pub fn insert(&mut self, brain: BrainId) -> ScheduleResult<()> {
        if self.members.contains_key(&brain) {
            return Err(ScheduleError::AlreadyRegistered(brain));
        }
        self.members.insert(brain, Membership::Active);
        self.active.insert(brain);
        Ok(())
    }

    /// Unregister `brain` from whatever partition it is in.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::NotRegistered`] if it was not registered.
    pub fn remove(&mut self, brain: BrainId) -> ScheduleResult<Membership> {
        let membership = self
            .members
            .remove(&brain)
            .ok_or(ScheduleError::NotRegistered(brain))?;
        self.detach(brain, membership);
        Ok(membership)
    }

    pub fn contains(&self, brain: BrainId) -> bool {
        self.members.contains_key(&brain)
    }

    pub fn membership(&self, brain: BrainId) -> Option<Membership> {
        self.members.get(&brain).copied()
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Move `brain` into the active set.  `false` if it is not registered.
    pub fn wake(&mut self, brain: BrainId) -> bool {
        self.move_to(brain, Membership::Active)
    }

    /// Move `brain` into the hibernating set.  `false` if it is not
    /// registered.
    pub fn hibernate(&mut self, brain: BrainId) -> bool {
        self.move_to(brain, Membership::Hibernating)
    }

    /// File `brain` under `tick`.  A tick that is not in the future relative
    /// to `now` makes the brain active instead.
    pub fn sleep_until(&mut self, brain: BrainId, tick: Tick, now: Tick) -> bool {
        if tick <= now {
            return self.wake(brain);
        }
        self.move_to(brain, Membership::Scheduled(tick))
    }

    /// Re-file `brain` according to the sleep request its tree produced on
    /// tick `now`.
    pub fn refile(&mut self, brain: BrainId, request: SleepRequest, now: Tick) -> bool {
        match request {
            SleepRequest::Now       => self.wake(brain),
            SleepRequest::Ticks(n)  => self.sleep_until(brain, now.offset(n.max(1)), now),
            SleepRequest::Hibernate => self.hibernate(brain),
        }
    }

    /// Move every brain whose wake tick is `now` or earlier into the active
    /// set and return them in tick order.
    pub fn promote(&mut self, now: Tick) -> Vec<BrainId> {
        let due = self.queue.drain_through(now);
        for &brain in &due {
            self.members.insert(brain, Membership::Active);
            self.active.insert(brain);
        }
        due
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Active brains in ascending id order.
    pub fn active(&self) -> impl Iterator<Item = BrainId> + '_ {
        self.active.iter().copied()
    }

    pub fn hibernating(&self) -> impl Iterator<Item = BrainId> + '_ {
        self.hibernating.iter().copied()
    }

    /// Brains filed under `tick`, ascending.
    pub fn scheduled_at(&self, tick: Tick) -> impl Iterator<Item = BrainId> + '_ {
        self.queue.bucket(tick)
    }

    /// Earliest tick with a scheduled brain.
    pub fn next_due(&self) -> Option<Tick> {
        self.queue.next_tick()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn scheduled_count(&self) -> usize {
        self.queue.len()
    }

    pub fn hibernating_count(&self) -> usize {
        self.hibernating.len()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn move_to(&mut self, brain: BrainId, to: Membership) -> bool {
        let Some(slot) = self.members.get_mut(&brain) else {
            return false;
        };
        let from = std::mem::replace(slot, to);
        if from == to {
            return true;
        }
        self.detach(brain, from);
        match to {
            Membership::Active => {
                self.active.insert(brain);
            }
            Membership::Scheduled(tick) => {
                self.queue.push(tick, brain);
            }
            Membership::Hibernating => {
                self.hibernating.insert(brain);
            }
        }
        true
    }

    fn detach(&mut self, brain: BrainId, from: Membership) {
        match from {
            Membership::Active => {
                self.active.remove(&brain);
            }
            Membership::Scheduled(tick) => {
                self.queue.remove(tick, brain);
            }
            Membership::Hibernating => {
                self.hibernating.remove(&brain);
            }
        }
    }
}
