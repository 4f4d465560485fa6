//! The node variant set.
//!
//! Every node kind is one variant of the crate-private `NodeKind` enum; the
//! shared parts (name, status, last result, parent/children links) live in
//! [`Node`].  Kind-specific state that must survive between ticks (cursor,
//! wake time, cooldown timestamp, …) is stored in the variant itself.

use std::fmt;
use std::time::Duration;

use bt_core::{AgentRng, EventData, NodeId};

use crate::{Status, TickContext};

/// Boxed predicate used by condition nodes.
pub type Predicate<S> = Box<dyn FnMut(&mut S, &TickContext) -> bool + Send>;

/// Boxed side effect used by action nodes.
pub type ActionFn<S> = Box<dyn FnMut(&mut S, &TickContext) + Send>;

/// Boxed cooldown generator used by [`Cooldown::Computed`].
pub type DurationFn = Box<dyn FnMut(&mut AgentRng) -> Duration + Send>;

// ── Node ──────────────────────────────────────────────────────────────────────

/// One node of a behavior tree arena.
pub struct Node<S> {
    pub(crate) name:        String,
    pub(crate) status:      Status,
    pub(crate) last_result: Status,
    pub(crate) parent:      Option<NodeId>,
    pub(crate) children:    Vec<NodeId>,
    pub(crate) kind:        NodeKind<S>,
}

impl<S> Node<S> {
    pub(crate) fn new(name: String, kind: NodeKind<S>, children: Vec<NodeId>) -> Self {
        Self {
            name,
            status: Status::Ready,
            last_result: Status::Ready,
            parent: None,
            children,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Status as of the live evaluation pass.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Status committed at the end of the previous update.
    pub fn last_result(&self) -> Status {
        self.last_result
    }

    /// Non-owning link to the parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Short name of the node's kind, e.g. `"Sequence"`.
    pub fn kind_name(&self) -> &'static str {
        self.kind.kind_name()
    }

    /// `true` for nodes that a Parallel re-arms on every visit.
    pub(crate) fn is_gate(&self) -> bool {
        matches!(self.kind, NodeKind::Condition(_) | NodeKind::MultiCondition { .. })
    }
}

// ── NodeKind ──────────────────────────────────────────────────────────────────

pub(crate) enum NodeKind<S> {
    Condition(Predicate<S>),
    MultiCondition {
        start:     Predicate<S>,
        cont:      Predicate<S>,
        satisfied: bool,
    },
    ConditionWait(Predicate<S>),
    Action(ActionFn<S>),
    Wait {
        duration: Duration,
        wake_at:  Duration,
    },
    Sequence { cursor: usize },
    Selector { cursor: usize },
    Loop(LoopState),
    Random { chosen: Option<usize> },
    Priority(PriorityState),
    Parallel { stop_on_any: bool },
    Decorator(Decorator),
    Event {
        event:     String,
        priority:  i32,
        triggered: bool,
        data:      Option<EventData>,
    },
    Latch {
        cooldown: Cooldown,
        state:    LatchState,
    },
}

impl<S> NodeKind<S> {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Condition(_)          => "Condition",
            NodeKind::MultiCondition { .. } => "MultiCondition",
            NodeKind::ConditionWait(_)      => "ConditionWait",
            NodeKind::Action(_)             => "Action",
            NodeKind::Wait { .. }           => "Wait",
            NodeKind::Sequence { .. }       => "Sequence",
            NodeKind::Selector { .. }       => "Selector",
            NodeKind::Loop(_)               => "Loop",
            NodeKind::Random { .. }         => "Random",
            NodeKind::Priority(_)           => "Priority",
            NodeKind::Parallel { .. }       => "Parallel",
            NodeKind::Decorator(d)          => d.name(),
            NodeKind::Event { .. }          => "Event",
            NodeKind::Latch { .. }          => "Latch",
        }
    }
}

/// Repetition state of a Loop node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopState {
    pub(crate) cursor:   usize,
    pub(crate) max_reps: Option<u32>,
    pub(crate) reps:     u32,
}

/// Re-evaluation state of a Priority node.
///
/// `next_eval == None` means "evaluate on the next visit"; Event triggers
/// below the node clear it.  `scatter` holds the one-off phase delay drawn at
/// construction and is consumed by the first visit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PriorityState {
    pub(crate) period:    Duration,
    pub(crate) next_eval: Option<Duration>,
    pub(crate) scatter:   Option<Duration>,
    pub(crate) selected:  Option<usize>,
}

/// Open/closed state of a Latch node.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LatchState {
    /// Cooldown drawn when the latch last opened.
    pub(crate) current:   Duration,
    pub(crate) last_open: Option<Duration>,
}

// ── Decorator ─────────────────────────────────────────────────────────────────

/// Single-child status remappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decorator {
    /// Swaps `Success` and `Failed`; `Running` passes through.
    Not,
    /// `Running` becomes `Failed`.
    FailIfRunning,
    /// `Success` becomes `Failed`.
    FailIfSuccess,
}

impl Decorator {
    pub fn name(self) -> &'static str {
        match self {
            Decorator::Not           => "Not",
            Decorator::FailIfRunning => "FailIfRunning",
            Decorator::FailIfSuccess => "FailIfSuccess",
        }
    }

    /// The decorator's truth table.
    pub fn apply(self, child: Status) -> Status {
        match (self, child) {
            (Decorator::Not, Status::Success)           => Status::Failed,
            (Decorator::Not, Status::Failed)            => Status::Success,
            (Decorator::FailIfRunning, Status::Running) => Status::Failed,
            (Decorator::FailIfSuccess, Status::Success) => Status::Failed,
            (_, other)                                  => other,
        }
    }
}

// ── Cooldown ──────────────────────────────────────────────────────────────────

/// How long a Latch stays closed after opening.
pub enum Cooldown {
    /// Always the same duration.
    Fixed(Duration),
    /// `base` scaled by a uniform factor in `[lo, hi)`, drawn per opening.
    Scattered { base: Duration, lo: f64, hi: f64 },
    /// Computed per opening by a user function.
    Computed(DurationFn),
}

impl Cooldown {
    pub(crate) fn next(&mut self, rng: &mut AgentRng) -> Duration {
        match self {
            Cooldown::Fixed(d)                   => *d,
            Cooldown::Scattered { base, lo, hi } => rng.scale_duration(*base, *lo, *hi),
            Cooldown::Computed(f)                => f(rng),
        }
    }
}

impl fmt::Display for Cooldown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cooldown::Fixed(d) => write!(f, "{:.2}s", d.as_secs_f64()),
            Cooldown::Scattered { base, lo, hi } => {
                write!(f, "{:.2}s x [{lo}, {hi})", base.as_secs_f64())
            }
            Cooldown::Computed(_) => f.write_str("fn"),
        }
    }
}
