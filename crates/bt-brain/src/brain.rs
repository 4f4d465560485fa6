//! `Brain`: one agent's decision-making controller.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bt_core::{AgentId, EventData, EventSource};
use bt_tree::{BehaviorTree, Status, TickContext};

/// Handler registered with [`Brain::add_event_handler`].
pub type EventHandler<S> = Box<dyn FnMut(&mut S, Option<&EventData>) + Send>;

/// Lifecycle hook (`on_start`, `on_initialization_complete`, `on_stop`).
pub type Hook<S> = Box<dyn FnMut(&mut S) + Send>;

/// Per-update hook run before the tree is visited.
pub type UpdateHook<S> = Box<dyn FnMut(&mut S, &TickContext) + Send>;

pub(crate) struct Hooks<S> {
    pub(crate) on_start:                   Option<Hook<S>>,
    pub(crate) on_initialization_complete: Option<Hook<S>>,
    pub(crate) on_stop:                    Option<Hook<S>>,
    pub(crate) do_update:                  Option<UpdateHook<S>>,
}

impl<S> Default for Hooks<S> {
    fn default() -> Self {
        Self {
            on_start:                   None,
            on_initialization_complete: None,
            on_stop:                    None,
            do_update:                  None,
        }
    }
}

/// Owns an agent's state, its (optional) behavior tree, named event
/// handlers, and lifecycle hooks.
///
/// A brain does not schedule itself: `start`/`stop`/`pause`/`resume` report
/// whether the wrangler should (un)register it, and the wrangler does the
/// registry work.
pub struct Brain<S> {
    agent:    AgentId,
    state:    S,
    tree:     Option<BehaviorTree<S>>,
    handlers: HashMap<String, EventHandler<S>>,
    hooks:    Hooks<S>,
    paused:   bool,
    stopped:  bool,
}

impl<S> Brain<S> {
    /// A stopped, tree-less brain.  See [`BrainBuilder`](crate::BrainBuilder)
    /// for the fluent form.
    pub fn new(agent: AgentId, state: S) -> Self {
        Self::from_parts(agent, state, None, HashMap::new(), Hooks::default())
    }

    pub(crate) fn from_parts(
        agent:    AgentId,
        state:    S,
        tree:     Option<BehaviorTree<S>>,
        handlers: HashMap<String, EventHandler<S>>,
        hooks:    Hooks<S>,
    ) -> Self {
        Self { agent, state, tree, handlers, hooks, paused: false, stopped: true }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn tree(&self) -> Option<&BehaviorTree<S>> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut BehaviorTree<S>> {
        self.tree.as_mut()
    }

    /// Install `tree`, returning the previous one.
    ///
    /// The previous tree's Event nodes are unsubscribed from `source`.  On a
    /// started brain the new tree subscribes in their place.
    pub fn set_tree(&mut self, mut tree: BehaviorTree<S>, source: &mut dyn EventSource) -> Option<BehaviorTree<S>> {
        let mut old = self.tree.take();
        if let Some(old) = old.as_mut() {
            old.stop(source);
        }
        if !self.stopped {
            tree.subscribe(self.agent, source);
        }
        self.tree = Some(tree);
        old
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Run `on_start`, subscribe the tree's Event nodes, then run
    /// `on_initialization_complete`.
    ///
    /// Returns `false` (and does nothing) while paused.
    pub fn start(&mut self, source: &mut dyn EventSource) -> bool {
        if self.paused {
            return false;
        }
        if let Some(hook) = self.hooks.on_start.as_mut() {
            hook(&mut self.state);
        }
        self.stopped = false;
        if let Some(tree) = self.tree.as_mut() {
            tree.subscribe(self.agent, source);
        }
        if let Some(hook) = self.hooks.on_initialization_complete.as_mut() {
            hook(&mut self.state);
        }
        tracing::debug!(agent = %self.agent, "brain started");
        true
    }

    /// Run `on_stop` and unsubscribe the tree's Event nodes.  Node statuses
    /// are kept.
    ///
    /// Returns `false` (and does nothing) while paused.
    pub fn stop(&mut self, source: &mut dyn EventSource) -> bool {
        if self.paused {
            return false;
        }
        if let Some(hook) = self.hooks.on_stop.as_mut() {
            hook(&mut self.state);
        }
        if let Some(tree) = self.tree.as_mut() {
            tree.stop(source);
        }
        self.stopped = true;
        tracing::debug!(agent = %self.agent, "brain stopped");
        true
    }

    /// Returns `false` if already paused.
    pub fn pause(&mut self) -> bool {
        !std::mem::replace(&mut self.paused, true)
    }

    /// Returns `false` if not paused.
    pub fn resume(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }

    // ── Update ────────────────────────────────────────────────────────────

    /// Run `do_update`, then one tree cycle.  Returns the root status, or
    /// `None` without a tree.
    pub fn update(&mut self, ctx: &TickContext) -> Option<Status> {
        if let Some(hook) = self.hooks.do_update.as_mut() {
            hook(&mut self.state, ctx);
        }
        let tree = self.tree.as_mut()?;
        Some(tree.update(ctx, &mut self.state))
    }

    /// Close an interrupted update: the root is recorded as `Failed`.
    pub fn abort_cycle(&mut self) {
        if let Some(tree) = self.tree.as_mut() {
            tree.abort_cycle();
        }
    }

    /// Requested sleep after the last update.  A brain without a tree is
    /// updated every tick.
    pub fn sleep_time(&self, now: Duration) -> Option<Duration> {
        match &self.tree {
            Some(tree) => tree.sleep_time(now),
            None => Some(Duration::ZERO),
        }
    }

    pub fn force_update(&mut self) {
        if let Some(tree) = self.tree.as_mut() {
            tree.force_update();
        }
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Register (or replace) the handler for `event`.
    pub fn add_event_handler<F>(&mut self, event: impl Into<String>, handler: F)
    where
        F: FnMut(&mut S, Option<&EventData>) + Send + 'static,
    {
        self.handlers.insert(event.into(), Box::new(handler));
    }

    pub fn has_event_handler(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Invoke the handler for `event`, if any.  Returns whether one ran.
    pub fn push_event(&mut self, event: &str, data: Option<&EventData>) -> bool {
        match self.handlers.get_mut(event) {
            Some(handler) => {
                handler(&mut self.state, data);
                true
            }
            None => false,
        }
    }

    /// Trigger the tree's Event nodes listening for `event`.  Returns how
    /// many fired.
    pub fn trigger_event(&mut self, event: &str, data: Option<EventData>) -> usize {
        self.tree.as_mut().map_or(0, |tree| tree.trigger_event(event, data))
    }

    /// Debug dump of the brain and its tree as of `now`.
    pub fn display(&self, now: Duration) -> BrainDump<'_, S> {
        BrainDump { brain: self, now }
    }
}

/// `Display` adapter returned by [`Brain::display`].
pub struct BrainDump<'a, S> {
    brain: &'a Brain<S>,
    now:   Duration,
}

impl<S> fmt::Display for BrainDump<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--brain-- {}", self.brain.agent)?;
        match self.brain.sleep_time(self.now) {
            Some(d) => writeln!(f, "sleep time: {:.2}", d.as_secs_f64())?,
            None => writeln!(f, "sleep time: none")?,
        }
        if let Some(tree) = &self.brain.tree {
            write!(f, "{}", tree.display(self.now))?;
        }
        Ok(())
    }
}
