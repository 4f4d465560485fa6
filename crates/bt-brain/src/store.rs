//! `BrainStore`: slot storage for brains, addressed by `BrainId`.
//!
//! Slots are never reused: a removed brain leaves a hole, so a stale
//! `BrainId` held by the host or an output sink can never alias a newer
//! brain.  An `AgentId → BrainId` index enforces one brain per agent.

use bt_core::{AgentId, BrainId};

use crate::{Brain, BrainError, BrainResult};

#[cfg(feature = "fx-hash")]
type AgentIndex = rustc_hash::FxHashMap<AgentId, BrainId>;
#[cfg(not(feature = "fx-hash"))]
type AgentIndex = std::collections::HashMap<AgentId, BrainId>;

pub struct BrainStore<S> {
    slots:    Vec<Option<Brain<S>>>,
    by_agent: AgentIndex,
}

impl<S> Default for BrainStore<S> {
    fn default() -> Self {
        Self { slots: Vec::new(), by_agent: AgentIndex::default() }
    }
}

impl<S> BrainStore<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `brain` in a fresh slot.
    ///
    /// # Errors
    ///
    /// [`BrainError::AgentHasBrain`] if the brain's agent already owns one.
    pub fn insert(&mut self, brain: Brain<S>) -> BrainResult<BrainId> {
        let agent = brain.agent();
        if self.by_agent.contains_key(&agent) {
            return Err(BrainError::AgentHasBrain(agent));
        }
        let id = BrainId(self.slots.len() as u32);
        self.slots.push(Some(brain));
        self.by_agent.insert(agent, id);
        Ok(id)
    }

    /// Take the brain out of its slot.  The slot stays empty.
    pub fn remove(&mut self, id: BrainId) -> Option<Brain<S>> {
        let brain = self.slots.get_mut(id.index())?.take()?;
        self.by_agent.remove(&brain.agent());
        Some(brain)
    }

    #[inline]
    pub fn get(&self, id: BrainId) -> Option<&Brain<S>> {
        self.slots.get(id.index())?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: BrainId) -> Option<&mut Brain<S>> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// The brain thinking for `agent`, if any.
    pub fn brain_of(&self, agent: AgentId) -> Option<BrainId> {
        self.by_agent.get(&agent).copied()
    }

    pub fn contains(&self, id: BrainId) -> bool {
        self.get(id).is_some()
    }

    /// Live brains in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (BrainId, &Brain<S>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|b| (BrainId(i as u32), b)))
    }

    /// Number of live brains.
    pub fn len(&self) -> usize {
        self.by_agent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_agent.is_empty()
    }

    /// Number of slots ever allocated, live or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
