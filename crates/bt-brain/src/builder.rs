//! Fluent builder for a [`Brain`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use bt_brain::BrainBuilder;
//!
//! let brain = BrainBuilder::new(AgentId(3), Npc::default())
//!     .on_start(|npc| npc.awake = true)
//!     .event_handler("attacked", |npc, _| npc.alert = true)
//!     .build_tree(seed, |b| {
//!         let flee = b.action("flee", |npc: &mut Npc, _| npc.fleeing = true);
//!         let ev = b.event("on attacked", "attacked", 0, [flee])?;
//!         let idle = b.wait("idle", Duration::from_secs(5));
//!         b.priority("root", [ev, idle], None, true)
//!     })?
//!     .build();
//! ```

use std::collections::HashMap;

use bt_core::{AgentId, AgentRng, EventData, NodeId};
use bt_tree::{BehaviorTree, TickContext, TreeBuilder, TreeResult};

use crate::brain::{EventHandler, Hooks};
use crate::{Brain, BrainResult};

pub struct BrainBuilder<S> {
    agent:    AgentId,
    state:    S,
    tree:     Option<BehaviorTree<S>>,
    handlers: HashMap<String, EventHandler<S>>,
    hooks:    Hooks<S>,
}

impl<S> BrainBuilder<S> {
    pub fn new(agent: AgentId, state: S) -> Self {
        Self {
            agent,
            state,
            tree: None,
            handlers: HashMap::new(),
            hooks: Hooks::default(),
        }
    }

    /// Use an already built tree.
    pub fn tree(mut self, tree: BehaviorTree<S>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Build the tree with an RNG seeded from `seed` and this brain's agent.
    /// `f` creates the nodes and returns the root.
    ///
    /// # Errors
    ///
    /// Any [`TreeError`](bt_tree::TreeError) raised while building.
    pub fn build_tree<F>(mut self, seed: u64, f: F) -> BrainResult<Self>
    where
        F: FnOnce(&mut TreeBuilder<S>) -> TreeResult<NodeId>,
    {
        let mut b = TreeBuilder::new(AgentRng::new(seed, self.agent));
        let root = f(&mut b)?;
        self.tree = Some(b.build(root)?);
        Ok(self)
    }

    pub fn on_start<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut S) + Send + 'static,
    {
        self.hooks.on_start = Some(Box::new(f));
        self
    }

    pub fn on_initialization_complete<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut S) + Send + 'static,
    {
        self.hooks.on_initialization_complete = Some(Box::new(f));
        self
    }

    pub fn on_stop<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut S) + Send + 'static,
    {
        self.hooks.on_stop = Some(Box::new(f));
        self
    }

    /// Runs before every tree update.
    pub fn do_update<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut S, &TickContext) + Send + 'static,
    {
        self.hooks.do_update = Some(Box::new(f));
        self
    }

    pub fn event_handler<F>(mut self, event: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&mut S, Option<&EventData>) + Send + 'static,
    {
        self.handlers.insert(event.into(), Box::new(f));
        self
    }

    pub fn build(self) -> Brain<S> {
        Brain::from_parts(self.agent, self.state, self.tree, self.handlers, self.hooks)
    }
}
