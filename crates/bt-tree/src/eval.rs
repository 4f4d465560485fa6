//! Visit, reset, step, commit, and sleep queries over a tree arena.
//!
//! `Visitor` carries everything a visit may touch (arena, tree RNG, agent
//! state, tick context) so the recursive walk needs no extra arguments.  The
//! passes that never call leaf closures are free functions over the arena.

use std::time::Duration;

use bt_core::{AgentRng, NodeId};

use crate::node::{Node, NodeKind};
use crate::{Status, TickContext};

pub(crate) struct Visitor<'a, S> {
    pub(crate) nodes: &'a mut [Node<S>],
    pub(crate) rng:   &'a mut AgentRng,
    pub(crate) state: &'a mut S,
    pub(crate) ctx:   &'a TickContext,
}

impl<S> Visitor<'_, S> {
    /// Evaluate `id` once and record the resulting status on it.
    pub(crate) fn visit(&mut self, id: NodeId) -> Status {
        let i = id.index();
        let status = match &self.nodes[i].kind {
            NodeKind::Sequence { .. } => self.visit_ordered(i, Status::Failed, Status::Success),
            NodeKind::Selector { .. } => self.visit_ordered(i, Status::Success, Status::Failed),
            NodeKind::Loop(_)         => self.visit_loop(i),
            NodeKind::Random { .. }   => self.visit_random(i),
            NodeKind::Priority(_)     => self.visit_priority(i),
            NodeKind::Parallel { .. } => self.visit_parallel(i),
            NodeKind::Event { .. }    => self.visit_event(i),
            NodeKind::Latch { .. }    => self.visit_latch(i),
            NodeKind::Decorator(d) => {
                let d = *d;
                let child = self.nodes[i].children[0];
                d.apply(self.visit(child))
            }
            NodeKind::Condition(_)
            | NodeKind::MultiCondition { .. }
            | NodeKind::ConditionWait(_)
            | NodeKind::Action(_)
            | NodeKind::Wait { .. } => self.visit_leaf(i),
        };
        self.nodes[i].status = status;
        status
    }

    fn child(&self, i: usize, k: usize) -> NodeId {
        self.nodes[i].children[k]
    }

    fn visit_leaf(&mut self, i: usize) -> Status {
        let ctx = self.ctx;
        let node = &mut self.nodes[i];
        let prev = node.status;
        match &mut node.kind {
            NodeKind::Condition(pred) => pass_fail(pred(self.state, ctx)),
            NodeKind::MultiCondition { start, cont, satisfied } => {
                *satisfied = if *satisfied { cont(self.state, ctx) } else { start(self.state, ctx) };
                pass_fail(*satisfied)
            }
            NodeKind::ConditionWait(pred) => {
                if pred(self.state, ctx) { Status::Success } else { Status::Running }
            }
            NodeKind::Action(f) => {
                f(self.state, ctx);
                Status::Success
            }
            NodeKind::Wait { duration, wake_at } => {
                if prev != Status::Running {
                    *wake_at = ctx.now.saturating_add(*duration);
                }
                if ctx.now >= *wake_at { Status::Success } else { Status::Running }
            }
            _ => Status::Failed,
        }
    }

    /// Shared walk of Sequence and Selector: stop on `Running` or `stop_on`,
    /// report `exhausted` after the last child.
    fn visit_ordered(&mut self, i: usize, stop_on: Status, exhausted: Status) -> Status {
        let mut cursor = match self.nodes[i].kind {
            NodeKind::Sequence { cursor } | NodeKind::Selector { cursor }
                if self.nodes[i].status == Status::Running => cursor,
            _ => 0,
        };
        let n = self.nodes[i].children.len();
        let status = loop {
            if cursor >= n {
                break exhausted;
            }
            let cs = self.visit(self.child(i, cursor));
            if cs == Status::Running || cs == stop_on {
                break cs;
            }
            cursor += 1;
        };
        if let NodeKind::Sequence { cursor: c } | NodeKind::Selector { cursor: c } =
            &mut self.nodes[i].kind
        {
            *c = cursor;
        }
        status
    }

    fn visit_loop(&mut self, i: usize) -> Status {
        let NodeKind::Loop(mut st) = self.nodes[i].kind else {
            return Status::Failed;
        };
        if self.nodes[i].status != Status::Running {
            st.cursor = 0;
            st.reps = 0;
        }
        let n = self.nodes[i].children.len();
        let status = loop {
            if st.cursor >= n {
                st.cursor = 0;
                st.reps = st.reps.saturating_add(1);
                if st.max_reps.is_some_and(|max| st.reps >= max) {
                    break Status::Success;
                }
                for k in 0..n {
                    let child = self.child(i, k);
                    reset(self.nodes, child);
                }
                break Status::Running;
            }
            let cs = self.visit(self.child(i, st.cursor));
            if cs == Status::Running || cs == Status::Failed {
                break cs;
            }
            st.cursor += 1;
        };
        if let NodeKind::Loop(slot) = &mut self.nodes[i].kind {
            *slot = st;
        }
        status
    }

    fn visit_random(&mut self, i: usize) -> Status {
        let n = self.nodes[i].children.len();
        if n == 0 {
            return Status::Failed;
        }
        let prev = match self.nodes[i].kind {
            NodeKind::Random { chosen } => chosen,
            _ => None,
        };
        let (status, chosen) = match prev {
            // Committed: only the chosen child is visited until the node
            // is reset.
            Some(c) if self.nodes[i].status != Status::Ready => (self.visit(self.child(i, c)), Some(c)),
            _ => {
                let start = self.rng.pick(n);
                let mut outcome = (Status::Failed, None);
                for k in 0..n {
                    let idx = (start + k) % n;
                    let cs = self.visit(self.child(i, idx));
                    if cs != Status::Failed {
                        outcome = (cs, Some(idx));
                        break;
                    }
                }
                outcome
            }
        };
        if let NodeKind::Random { chosen: slot } = &mut self.nodes[i].kind {
            *slot = chosen;
        }
        status
    }

    /// Re-scan the children when the period is due.  Between due
    /// evaluations only a running selected child is visited; otherwise the
    /// node reports its own status unchanged.  After a step has reset it
    /// that status is `Ready`, which a parent Sequence or Selector walks
    /// past like a success.
    fn visit_priority(&mut self, i: usize) -> Status {
        let NodeKind::Priority(mut st) = self.nodes[i].kind else {
            return Status::Failed;
        };
        let now = self.ctx.now;
        let n = self.nodes[i].children.len();
        let mut status = self.nodes[i].status;

        if st.next_eval.is_none_or(|due| now >= due) {
            let old_event = st
                .selected
                .and_then(|s| event_priority(&self.nodes[self.child(i, s).index()]));
            st.next_eval = Some(now.saturating_add(st.scatter.take().unwrap_or(st.period)));

            let mut found = None;
            for idx in 0..n {
                let child = self.child(i, idx);
                // A previously selected Event keeps equal or higher priority
                // Events in the running even after an earlier match.
                let test_anyway = match (old_event, event_priority(&self.nodes[child.index()])) {
                    (Some(old), Some(p)) => old <= p,
                    _ => false,
                };
                if found.is_none() || test_anyway {
                    if self.nodes[child.index()].status.is_done() {
                        reset(self.nodes, child);
                    }
                    let cs = self.visit(child);
                    if matches!(cs, Status::Success | Status::Running) {
                        if let Some(prev) = st.selected.filter(|&p| test_anyway && p != idx) {
                            let prev = self.child(i, prev);
                            reset(self.nodes, prev);
                        }
                        found = Some(cs);
                        st.selected = Some(idx);
                    }
                } else {
                    reset(self.nodes, child);
                }
            }
            status = match found {
                Some(cs) => cs,
                None => {
                    st.selected = None;
                    Status::Failed
                }
            };
        } else if let Some(s) = st.selected {
            let child = self.child(i, s);
            if self.nodes[child.index()].status == Status::Running {
                status = self.visit(child);
                if status != Status::Running {
                    st.next_eval = None;
                }
            }
        }

        if let NodeKind::Priority(slot) = &mut self.nodes[i].kind {
            *slot = st;
        }
        status
    }

    fn visit_parallel(&mut self, i: usize) -> Status {
        let stop_on_any = matches!(self.nodes[i].kind, NodeKind::Parallel { stop_on_any: true });
        let mut all_done = true;
        let mut any_done = false;
        for k in 0..self.nodes[i].children.len() {
            let child = self.child(i, k);
            if self.nodes[child.index()].is_gate() {
                self.nodes[child.index()].status = Status::Ready;
            }
            if self.nodes[child.index()].status != Status::Success && self.visit(child) == Status::Failed {
                return Status::Failed;
            }
            if self.nodes[child.index()].status == Status::Running {
                all_done = false;
            } else {
                any_done = true;
            }
        }
        if all_done || (stop_on_any && any_done) { Status::Success } else { Status::Running }
    }

    fn visit_event(&mut self, i: usize) -> Status {
        let triggered = matches!(self.nodes[i].kind, NodeKind::Event { triggered: true, .. });
        let mut status = self.nodes[i].status;
        if status == Status::Ready && triggered {
            status = Status::Running;
        }
        if status == Status::Running {
            status = self.visit(self.child(i, 0));
        }
        status
    }

    fn visit_latch(&mut self, i: usize) -> Status {
        let now = self.ctx.now;
        let mut status = self.nodes[i].status;
        if status == Status::Ready {
            let mut opened = None;
            if let NodeKind::Latch { cooldown, state } = &mut self.nodes[i].kind {
                if state.last_open.is_none_or(|t| now >= t.saturating_add(state.current)) {
                    state.last_open = Some(now);
                    state.current = cooldown.next(self.rng);
                    opened = Some(state.current);
                }
            }
            status = match opened {
                Some(cooldown) => {
                    tracing::debug!(
                        agent = %self.ctx.agent,
                        node = %self.nodes[i].name,
                        cooldown_s = cooldown.as_secs_f64(),
                        "latch opened"
                    );
                    Status::Running
                }
                None => Status::Failed,
            };
        }
        if status == Status::Running {
            status = self.visit(self.child(i, 0));
        }
        status
    }
}

#[inline]
fn pass_fail(ok: bool) -> Status {
    if ok { Status::Success } else { Status::Failed }
}

pub(crate) fn event_priority<S>(node: &Node<S>) -> Option<i32> {
    match node.kind {
        NodeKind::Event { priority, .. } => Some(priority),
        _ => None,
    }
}

// ── Reset / step / commit ─────────────────────────────────────────────────────

/// Return `id` and its subtree to `Ready`.
///
/// Kind state (cursors, counters, selections, trigger flags) is cleared on
/// every call; status and children are only touched when the node is not
/// already `Ready`, so a second reset is a no-op.  Priority timing and Latch
/// timestamps survive resets.
pub(crate) fn reset<S>(nodes: &mut [Node<S>], id: NodeId) {
    let i = id.index();
    let node = &mut nodes[i];
    clear_kind_state(node);
    if node.status == Status::Ready {
        return;
    }
    node.status = Status::Ready;
    for k in 0..nodes[i].children.len() {
        let child = nodes[i].children[k];
        reset(nodes, child);
    }
}

/// Reset every node in the arena, reachable through a `Ready` parent or
/// not.  Used when a visit was cut short and the tree's shape no longer
/// says which nodes it touched.
pub(crate) fn reset_all<S>(nodes: &mut [Node<S>]) {
    for node in nodes {
        clear_kind_state(node);
        node.status = Status::Ready;
    }
}

fn clear_kind_state<S>(node: &mut Node<S>) {
    match &mut node.kind {
        NodeKind::Sequence { cursor } | NodeKind::Selector { cursor } => *cursor = 0,
        NodeKind::Loop(st) => {
            st.cursor = 0;
            st.reps = 0;
        }
        NodeKind::Random { chosen } => *chosen = None,
        NodeKind::Priority(st) => st.selected = None,
        NodeKind::Event { triggered, .. } => *triggered = false,
        NodeKind::MultiCondition { satisfied, .. } => *satisfied = false,
        _ => {}
    }
}

/// Post-commit housekeeping: finished subtrees reset, running ones step
/// their children.
pub(crate) fn step<S>(nodes: &mut [Node<S>], id: NodeId) {
    let i = id.index();
    let parallel = matches!(nodes[i].kind, NodeKind::Parallel { .. });
    if nodes[i].status != Status::Running {
        reset(nodes, id);
    } else if parallel {
        // Re-arm finished gates instead of stepping the children.
        for k in 0..nodes[i].children.len() {
            let c = nodes[i].children[k].index();
            let child = &mut nodes[c];
            if child.is_gate() && child.status == Status::Success {
                child.status = Status::Ready;
            }
        }
    } else {
        for k in 0..nodes[i].children.len() {
            let child = nodes[i].children[k];
            step(nodes, child);
        }
    }
    if let NodeKind::Event { triggered, .. } = &mut nodes[i].kind {
        *triggered = false;
    }
}

/// Copy every node's live status into its last result.
pub(crate) fn commit<S>(nodes: &mut [Node<S>]) {
    for node in nodes {
        node.last_result = node.status;
    }
}

// ── Sleep queries ─────────────────────────────────────────────────────────────

/// Interval `node` itself asks for, or `None` for no opinion.
pub(crate) fn own_sleep<S>(node: &Node<S>, now: Duration) -> Option<Duration> {
    match (&node.kind, node.status) {
        (NodeKind::Priority(st), Status::Running | Status::Ready) => {
            Some(st.next_eval.map_or(Duration::ZERO, |due| due.saturating_sub(now)))
        }
        (NodeKind::Wait { wake_at, .. }, Status::Running) => Some(wake_at.saturating_sub(now)),
        _ => None,
    }
}

/// Minimum requested interval over `id` and its running descendants.
///
/// A running node that neither declares an interval nor has a running
/// child asks for zero (re-tick next frame).
pub(crate) fn subtree_sleep<S>(nodes: &[Node<S>], id: NodeId, now: Duration) -> Option<Duration> {
    let node = &nodes[id.index()];
    let children = node
        .children
        .iter()
        .filter(|c| nodes[c.index()].status == Status::Running)
        .filter_map(|&c| subtree_sleep(nodes, c, now))
        .min();
    let own = own_sleep(node, now);
    match own.into_iter().chain(children).min() {
        None if node.status == Status::Running => Some(Duration::ZERO),
        sleep => sleep,
    }
}

/// Kind-specific detail shown in tree dumps while the node is running.
pub(crate) fn debug_string<S>(node: &Node<S>, now: Duration) -> String {
    match &node.kind {
        NodeKind::Sequence { cursor } | NodeKind::Selector { cursor } => cursor.to_string(),
        NodeKind::Loop(st) => match st.max_reps {
            Some(max) => format!("{} rep {}/{max}", st.cursor, st.reps),
            None => format!("{} rep {}", st.cursor, st.reps),
        },
        NodeKind::Wait { wake_at, .. } => format!("{:.2}", wake_at.saturating_sub(now).as_secs_f64()),
        NodeKind::Random { chosen } => chosen.map_or_else(|| "-1".to_string(), |c| c.to_string()),
        NodeKind::Priority(st) => {
            let eval_in = st.next_eval.map_or(Duration::ZERO, |due| due.saturating_sub(now));
            let selected = st.selected.map_or(-1, |s| s as i64);
            format!("execute {selected}, eval in {:.2}", eval_in.as_secs_f64())
        }
        NodeKind::Event { event, priority, .. } => format!("{event} p{priority}"),
        NodeKind::Latch { cooldown, state } => {
            format!("{cooldown}, drawn {:.2}", state.current.as_secs_f64())
        }
        _ => String::new(),
    }
}
