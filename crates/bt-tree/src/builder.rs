//! Bottom-up tree construction.
//!
//! Leaves are created first and return their `NodeId`; composites take the
//! ids of already-built children and adopt them.  Every structural mistake
//! (wrong child count, a child adopted twice, an id from nowhere, a node
//! never attached under the root) is reported here, so a built tree never
//! has to check its own shape while it runs.
//!
//! ```rust,ignore
//! let mut b = TreeBuilder::<Npc>::new(AgentRng::new(seed, agent));
//! let hungry = b.condition("hungry", |npc, _| npc.hunger > 0.5);
//! let eat    = b.action("eat", |npc, _| npc.hunger = 0.0);
//! let idle   = b.wait("idle", Duration::from_secs(2));
//! let meal   = b.sequence("meal", [hungry, eat])?;
//! let root   = b.selector("root", [meal, idle])?;
//! let tree   = b.build(root)?;
//! ```

use std::time::Duration;

use bt_core::{AgentRng, NodeId};

use crate::node::{LatchState, LoopState, Node, NodeKind, PriorityState};
use crate::{BehaviorTree, Cooldown, Decorator, TickContext, TreeError, TreeResult};

/// Default Priority re-evaluation period.
pub const DEFAULT_PRIORITY_PERIOD: Duration = Duration::from_secs(1);

/// Accumulates nodes into an arena and validates the final shape.
pub struct TreeBuilder<S> {
    nodes: Vec<Node<S>>,
    rng:   AgentRng,
}

impl<S> TreeBuilder<S> {
    /// Start an empty arena.  `rng` becomes the tree's RNG: it draws Priority
    /// scatter offsets here and Random picks and Latch cooldowns later.
    pub fn new(rng: AgentRng) -> Self {
        Self { nodes: Vec::new(), rng }
    }

    /// Number of nodes created so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Leaves ────────────────────────────────────────────────────────────

    /// SUCCESS when `pred` holds, FAILED otherwise.
    pub fn condition<F>(&mut self, name: impl Into<String>, pred: F) -> NodeId
    where
        F: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
    {
        self.push(name, NodeKind::Condition(Box::new(pred)), Vec::new())
    }

    /// Calls `start` until it holds once, then `cont` on every later visit
    /// until the node is reset.
    pub fn multi_condition<F, G>(&mut self, name: impl Into<String>, start: F, cont: G) -> NodeId
    where
        F: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
        G: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
    {
        let kind = NodeKind::MultiCondition {
            start:     Box::new(start),
            cont:      Box::new(cont),
            satisfied: false,
        };
        self.push(name, kind, Vec::new())
    }

    /// RUNNING until `pred` holds, then SUCCESS.
    pub fn condition_wait<F>(&mut self, name: impl Into<String>, pred: F) -> NodeId
    where
        F: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
    {
        self.push(name, NodeKind::ConditionWait(Box::new(pred)), Vec::new())
    }

    /// Runs `f` once per visit and succeeds.
    pub fn action<F>(&mut self, name: impl Into<String>, f: F) -> NodeId
    where
        F: FnMut(&mut S, &TickContext) + Send + 'static,
    {
        self.push(name, NodeKind::Action(Box::new(f)), Vec::new())
    }

    pub fn wait(&mut self, name: impl Into<String>, duration: Duration) -> NodeId {
        let kind = NodeKind::Wait { duration, wake_at: Duration::ZERO };
        self.push(name, kind, Vec::new())
    }

    // ── Composites ────────────────────────────────────────────────────────

    pub fn sequence<I>(&mut self, name: impl Into<String>, children: I) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.composite(name, NodeKind::Sequence { cursor: 0 }, children)
    }

    pub fn selector<I>(&mut self, name: impl Into<String>, children: I) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.composite(name, NodeKind::Selector { cursor: 0 }, children)
    }

    /// A Sequence that restarts after each full pass.  `max_reps = None`
    /// loops forever.
    pub fn loop_node<I>(
        &mut self,
        name:     impl Into<String>,
        children: I,
        max_reps: Option<u32>,
    ) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let kind = NodeKind::Loop(LoopState { cursor: 0, max_reps, reps: 0 });
        self.composite(name, kind, children)
    }

    pub fn random<I>(&mut self, name: impl Into<String>, children: I) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let children: Vec<NodeId> = children.into_iter().collect();
        if children.is_empty() {
            return Err(TreeError::NoChildren { kind: "Random" });
        }
        self.composite(name, NodeKind::Random { chosen: None }, children)
    }

    /// Mutually exclusive alternatives re-evaluated every `period`
    /// (default [`DEFAULT_PRIORITY_PERIOD`]).
    ///
    /// With `scatter`, the evaluation after the first visit is delayed by a
    /// one-off offset drawn uniformly from `[0.5, 1.5) * period`, so copies
    /// of the same tree drift out of phase.
    pub fn priority<I>(
        &mut self,
        name:     impl Into<String>,
        children: I,
        period:   Option<Duration>,
        scatter:  bool,
    ) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let period = period.unwrap_or(DEFAULT_PRIORITY_PERIOD);
        if period.is_zero() {
            return Err(TreeError::ZeroPeriod);
        }
        let scatter = scatter.then(|| self.rng.scale_duration(period, 0.5, 1.5));
        let kind = NodeKind::Priority(PriorityState {
            period,
            next_eval: None,
            scatter,
            selected: None,
        });
        self.composite(name, kind, children)
    }

    /// Resolves SUCCESS once every child has.
    pub fn parallel<I>(&mut self, name: impl Into<String>, children: I) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.composite(name, NodeKind::Parallel { stop_on_any: false }, children)
    }

    /// Resolves SUCCESS as soon as any child has.
    pub fn parallel_any<I>(&mut self, name: impl Into<String>, children: I) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.composite(name, NodeKind::Parallel { stop_on_any: true }, children)
    }

    // ── Single-child wrappers ─────────────────────────────────────────────

    pub fn decorate(
        &mut self,
        name:      impl Into<String>,
        decorator: Decorator,
        child:     NodeId,
    ) -> TreeResult<NodeId> {
        self.composite(name, NodeKind::Decorator(decorator), [child])
    }

    pub fn not(&mut self, name: impl Into<String>, child: NodeId) -> TreeResult<NodeId> {
        self.decorate(name, Decorator::Not, child)
    }

    pub fn fail_if_running(&mut self, name: impl Into<String>, child: NodeId) -> TreeResult<NodeId> {
        self.decorate(name, Decorator::FailIfRunning, child)
    }

    pub fn fail_if_success(&mut self, name: impl Into<String>, child: NodeId) -> TreeResult<NodeId> {
        self.decorate(name, Decorator::FailIfSuccess, child)
    }

    /// Wraps exactly one child that runs after the agent receives `event`.
    ///
    /// Takes the children as a list so a malformed tree description is
    /// reported as [`TreeError::WrongChildCount`] instead of being
    /// unrepresentable.
    pub fn event<I>(
        &mut self,
        name:     impl Into<String>,
        event:    impl Into<String>,
        priority: i32,
        children: I,
    ) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let children: Vec<NodeId> = children.into_iter().collect();
        if children.len() != 1 {
            return Err(TreeError::WrongChildCount {
                kind:     "Event",
                expected: 1,
                got:      children.len(),
            });
        }
        let kind = NodeKind::Event {
            event: event.into(),
            priority,
            triggered: false,
            data: None,
        };
        self.composite(name, kind, children)
    }

    /// Lets `child` start at most once per cooldown.
    pub fn latch(
        &mut self,
        name:     impl Into<String>,
        cooldown: Cooldown,
        child:    NodeId,
    ) -> TreeResult<NodeId> {
        let kind = NodeKind::Latch { cooldown, state: LatchState::default() };
        self.composite(name, kind, [child])
    }

    // ── Compound helpers ──────────────────────────────────────────────────

    /// `Sequence(Condition(pred), child)`.
    pub fn if_node<F>(&mut self, name: impl Into<String>, pred: F, child: NodeId) -> TreeResult<NodeId>
    where
        F: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
    {
        let name = name.into();
        let cond = self.condition(format!("{name}: if"), pred);
        self.sequence(name, [cond, child])
    }

    /// `Parallel(Condition(pred), child)`: `child` runs only while `pred`
    /// keeps holding.
    pub fn while_node<F>(&mut self, name: impl Into<String>, pred: F, child: NodeId) -> TreeResult<NodeId>
    where
        F: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
    {
        let name = name.into();
        let cond = self.condition(format!("{name}: while"), pred);
        self.parallel(name, [cond, child])
    }

    /// `Parallel(MultiCondition(start, cont), child)`.
    pub fn if_then_do_while_node<F, G>(
        &mut self,
        name:  impl Into<String>,
        start: F,
        cont:  G,
        child: NodeId,
    ) -> TreeResult<NodeId>
    where
        F: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
        G: FnMut(&mut S, &TickContext) -> bool + Send + 'static,
    {
        let name = name.into();
        let cond = self.multi_condition(format!("{name}: if-then-while"), start, cont);
        self.parallel(name, [cond, child])
    }

    // ── Finish ────────────────────────────────────────────────────────────

    /// Validate the arena and hand it to a [`BehaviorTree`].
    ///
    /// # Errors
    ///
    /// - [`TreeError::UnknownNode`] if `root` was not created here.
    /// - [`TreeError::RootHasParent`] if `root` was adopted by another node.
    /// - [`TreeError::Orphan`] for the first node not reachable from `root`.
    pub fn build(self, root: NodeId) -> TreeResult<BehaviorTree<S>> {
        let root_node = self.nodes.get(root.index()).ok_or(TreeError::UnknownNode(root))?;
        if root_node.parent.is_some() {
            return Err(TreeError::RootHasParent(root));
        }
        // Every adopted node has a parent, so the only node without one must
        // be the root.
        if let Some(orphan) = self
            .nodes
            .iter()
            .enumerate()
            .find(|(i, n)| n.parent.is_none() && *i != root.index())
        {
            return Err(TreeError::Orphan(node_id(orphan.0)));
        }
        Ok(BehaviorTree::from_parts(self.nodes, root, self.rng))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn push(&mut self, name: impl Into<String>, kind: NodeKind<S>, children: Vec<NodeId>) -> NodeId {
        let id = node_id(self.nodes.len());
        self.nodes.push(Node::new(name.into(), kind, children));
        id
    }

    fn composite<I>(
        &mut self,
        name:     impl Into<String>,
        kind:     NodeKind<S>,
        children: I,
    ) -> TreeResult<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let children: Vec<NodeId> = children.into_iter().collect();
        for (i, &child) in children.iter().enumerate() {
            let node = self.nodes.get(child.index()).ok_or(TreeError::UnknownNode(child))?;
            if node.parent.is_some() || children[..i].contains(&child) {
                return Err(TreeError::AlreadyParented(child));
            }
        }
        let id = node_id(self.nodes.len());
        for &child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node::new(name.into(), kind, children));
        Ok(id)
    }
}

#[inline]
fn node_id(index: usize) -> NodeId {
    NodeId(index as u32)
}
