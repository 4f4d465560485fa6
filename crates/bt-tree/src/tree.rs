//! `BehaviorTree`: the per-agent tree handle.

use std::fmt;
use std::time::Duration;

use bt_core::{AgentId, AgentRng, EventData, EventSource, NodeId};

use crate::eval::{self, Visitor};
use crate::node::{Node, NodeKind};
use crate::{Status, TickContext};

/// Effects of an Event trigger that reach outside the triggered node.
///
/// `raise_event` returns these instead of touching ancestors directly;
/// `apply_signal` (or `trigger_event`, which does both) carries them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSignal {
    /// Every Priority ancestor of the node forgets its last evaluation and
    /// re-evaluates on the next visit.
    InvalidateAncestors(NodeId),
    /// The tree wants to be updated on the next tick regardless of its
    /// sleep time.
    ForceUpdate,
}

/// One agent's behavior tree: the node arena, its RNG, and the force-update
/// flag.
pub struct BehaviorTree<S> {
    nodes:        Vec<Node<S>>,
    root:         NodeId,
    rng:          AgentRng,
    force_update: bool,
    events:       Vec<NodeId>,
    subscribed:   Option<AgentId>,
}

impl<S> BehaviorTree<S> {
    pub(crate) fn from_parts(nodes: Vec<Node<S>>, root: NodeId, rng: AgentRng) -> Self {
        let events = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Event { .. }))
            .map(|(i, _)| NodeId(i as u32))
            .collect();
        Self { nodes, root, rng, force_update: false, events, subscribed: None }
    }

    // ── Update cycle ──────────────────────────────────────────────────────

    /// One visit + commit + step cycle.  Returns the root's status as of the
    /// visit (before the step pass may reset it).
    pub fn update(&mut self, ctx: &TickContext, state: &mut S) -> Status {
        let status = {
            let mut visitor = Visitor {
                nodes: &mut self.nodes,
                rng:   &mut self.rng,
                state,
                ctx,
            };
            visitor.visit(self.root)
        };
        eval::commit(&mut self.nodes);
        eval::step(&mut self.nodes, self.root);
        self.force_update = false;
        status
    }

    /// Close a cycle whose visit did not complete: the root is recorded as
    /// `Failed` and committed, then every node returns to `Ready`.
    ///
    /// A panic can leave nodes under a still-`Ready` parent half visited,
    /// so the whole arena is reset rather than walked from the root.
    pub fn abort_cycle(&mut self) {
        let root = self.root.index();
        self.nodes[root].status = Status::Failed;
        eval::commit(&mut self.nodes);
        eval::reset_all(&mut self.nodes);
        self.force_update = false;
    }

    /// Return every node to `Ready`.
    pub fn reset(&mut self) {
        eval::reset(&mut self.nodes, self.root);
    }

    // ── Scheduling queries ────────────────────────────────────────────────

    pub fn force_update(&mut self) {
        self.force_update = true;
    }

    pub fn is_force_update(&self) -> bool {
        self.force_update
    }

    /// How long the tree may sleep after its last update.
    ///
    /// `Some(ZERO)` while force-updated or while any running node has no
    /// declared interval; the minimum declared interval otherwise; `None`
    /// when nothing is running and the agent may hibernate.
    pub fn sleep_time(&self, now: Duration) -> Option<Duration> {
        if self.force_update {
            return Some(Duration::ZERO);
        }
        eval::subtree_sleep(&self.nodes, self.root, now)
    }

    // ── Events ────────────────────────────────────────────────────────────

    /// Register every Event node's name with `source` for `agent`.
    pub fn subscribe(&mut self, agent: AgentId, source: &mut dyn EventSource) {
        if self.subscribed.is_some() {
            return;
        }
        for name in self.event_names() {
            source.listen_for_event(agent, name);
        }
        self.subscribed = Some(agent);
    }

    /// Unregister every Event node.  Node statuses are left untouched.
    pub fn stop(&mut self, source: &mut dyn EventSource) {
        let Some(agent) = self.subscribed.take() else {
            return;
        };
        for name in self.event_names() {
            source.remove_event_callback(agent, name);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.is_some()
    }

    /// Distinct event names the tree listens for, in node order.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.events.len());
        for &id in &self.events {
            if let NodeKind::Event { event, .. } = &self.nodes[id.index()].kind {
                if !names.contains(&event.as_str()) {
                    names.push(event);
                }
            }
        }
        names
    }

    /// Payload of the latest trigger of Event node `id`.
    pub fn event_data(&self, id: NodeId) -> Option<&EventData> {
        match &self.nodes.get(id.index())?.kind {
            NodeKind::Event { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    /// Mark every Event node listening for `name` as triggered and return
    /// the signals the triggers produce.  Nothing is applied to ancestors.
    pub fn raise_event(&mut self, name: &str, data: Option<EventData>) -> Vec<TreeSignal> {
        let mut signals = Vec::new();
        for k in 0..self.events.len() {
            let id = self.events[k];
            let i = id.index();
            let matches = matches!(&self.nodes[i].kind, NodeKind::Event { event, .. } if event == name);
            if !matches {
                continue;
            }
            if self.nodes[i].status == Status::Running {
                let child = self.nodes[i].children[0];
                eval::reset(&mut self.nodes, child);
            }
            if let NodeKind::Event { triggered, data: slot, .. } = &mut self.nodes[i].kind {
                *triggered = true;
                *slot = data.clone();
            }
            signals.push(TreeSignal::InvalidateAncestors(id));
        }
        if !signals.is_empty() {
            signals.push(TreeSignal::ForceUpdate);
        }
        signals
    }

    pub fn apply_signal(&mut self, signal: TreeSignal) {
        match signal {
            TreeSignal::InvalidateAncestors(id) => {
                let mut cursor = self.nodes.get(id.index()).and_then(|n| n.parent);
                while let Some(p) = cursor {
                    let node = &mut self.nodes[p.index()];
                    if let NodeKind::Priority(st) = &mut node.kind {
                        st.next_eval = None;
                    }
                    cursor = node.parent;
                }
            }
            TreeSignal::ForceUpdate => self.force_update = true,
        }
    }

    /// Raise `name` and apply the resulting signals.  Returns the number of
    /// Event nodes triggered.
    pub fn trigger_event(&mut self, name: &str, data: Option<EventData>) -> usize {
        let signals = self.raise_event(name, data);
        let triggered = signals.len().saturating_sub(1);
        for signal in signals {
            self.apply_signal(signal);
        }
        tracing::trace!(event = name, triggered, "event raised");
        triggered
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_status(&self) -> Status {
        self.nodes[self.root.index()].status
    }

    /// Root status committed by the last update.
    pub fn last_result(&self) -> Status {
        self.nodes[self.root.index()].last_result
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<S>> {
        self.nodes.get(id.index())
    }

    pub fn status(&self, id: NodeId) -> Option<Status> {
        self.node(id).map(Node::status)
    }

    /// Index of the child a Sequence, Selector, Loop, Random or Priority
    /// node is currently on.
    pub fn selected_child(&self, id: NodeId) -> Option<usize> {
        match &self.node(id)?.kind {
            NodeKind::Sequence { cursor } | NodeKind::Selector { cursor } => Some(*cursor),
            NodeKind::Loop(st) => Some(st.cursor),
            NodeKind::Random { chosen } => *chosen,
            NodeKind::Priority(st) => st.selected,
            _ => None,
        }
    }

    /// Completed passes of a Loop node.
    pub fn loop_reps(&self, id: NodeId) -> Option<u32> {
        match &self.node(id)?.kind {
            NodeKind::Loop(st) => Some(st.reps),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<S>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Indented dump of the whole tree as of `now`.
    pub fn display(&self, now: Duration) -> TreeDump<'_, S> {
        TreeDump { tree: self, now }
    }
}

// ── TreeDump ──────────────────────────────────────────────────────────────────

/// `Display` adapter returned by [`BehaviorTree::display`].
///
/// One line per node, children indented by `"   >"`:
///
/// ```text
/// root - RUNNING <RUNNING> (1)>2.00
///    >hungry - READY <FAILED> ()>0.00
///    >idle - RUNNING <RUNNING> (2.00)>2.00
/// ```
pub struct TreeDump<'a, S> {
    tree: &'a BehaviorTree<S>,
    now:  Duration,
}

impl<S> TreeDump<'_, S> {
    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: &str) -> fmt::Result {
        let node = &self.tree.nodes[id.index()];
        let debug = if node.status == Status::Running {
            eval::debug_string(node, self.now)
        } else {
            String::new()
        };
        let sleep = eval::subtree_sleep(&self.tree.nodes, id, self.now).unwrap_or(Duration::ZERO);
        writeln!(
            f,
            "{indent}{} - {} <{}> ({debug})>{:.2}",
            node.name,
            node.status,
            node.last_result,
            sleep.as_secs_f64()
        )?;
        let child_indent = format!("{indent}   >");
        for &child in &node.children {
            self.write_node(f, child, &child_indent)?;
        }
        Ok(())
    }
}

impl<S> fmt::Display for TreeDump<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.tree.root, "")
    }
}
