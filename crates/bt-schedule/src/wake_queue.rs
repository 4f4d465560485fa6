//! `WakeQueue`: sparse per-tick brain activation queue.
//!
//! # Why this exists
//!
//! Most brains are asleep most ticks (waiting on a `Wait` node, between
//! Priority evaluations).  Iterating every registered brain each tick to ask
//! "are you due?" would cost O(N) per tick regardless of how many brains
//! actually think.
//!
//! `WakeQueue` inverts the problem: after an update a brain files itself
//! under the absolute tick at which it next needs attention.  Each tick the
//! wrangler drains only the buckets at or before that tick, O(due) work
//! instead of O(N).
//!
//! # Performance note
//!
//! `BTreeMap` gives O(log W) insert and O(log W) pop where W = number of
//! distinct wake ticks currently enqueued.  Buckets are `BTreeSet`s so a
//! brain can be pulled out of its bucket early (event wake) in O(log B) and
//! drained buckets come out in ascending `BrainId` order.

use std::collections::{BTreeMap, BTreeSet};

use bt_core::{BrainId, Tick};

/// A priority queue mapping simulation ticks → brains that wake at that tick.
#[derive(Default, Debug)]
pub struct WakeQueue {
    inner: BTreeMap<Tick, BTreeSet<BrainId>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `brain` to wake at `tick`.  Returns `false` if it was
    /// already queued for that tick.
    pub fn push(&mut self, tick: Tick, brain: BrainId) -> bool {
        let inserted = self.inner.entry(tick).or_default().insert(brain);
        if inserted {
            self.total += 1;
        }
        inserted
    }

    /// Take `brain` out of the bucket for `tick`.  Empty buckets are dropped.
    pub fn remove(&mut self, tick: Tick, brain: BrainId) -> bool {
        let Some(bucket) = self.inner.get_mut(&tick) else {
            return false;
        };
        let removed = bucket.remove(&brain);
        if removed {
            self.total -= 1;
            if bucket.is_empty() {
                self.inner.remove(&tick);
            }
        }
        removed
    }

    /// Remove and return every brain scheduled at or before `tick`, in tick
    /// order.
    pub fn drain_through(&mut self, tick: Tick) -> Vec<BrainId> {
        let later = self.inner.split_off(&tick.offset(1));
        let due = std::mem::replace(&mut self.inner, later);
        let brains: Vec<BrainId> = due.into_values().flatten().collect();
        self.total -= brains.len();
        brains
    }

    /// The earliest tick with at least one queued brain, or `None` if empty.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    /// Brains queued for `tick`, ascending.
    pub fn bucket(&self, tick: Tick) -> impl Iterator<Item = BrainId> + '_ {
        self.inner.get(&tick).into_iter().flatten().copied()
    }

    /// Total number of (tick, brain) entries across all future ticks.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct future ticks that have at least one queued brain.
    pub fn tick_count(&self) -> usize {
        self.inner.len()
    }
}
