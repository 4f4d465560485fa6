//! `bt-tree`: behavior-tree nodes and the per-agent tree handle.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`status`]  | `Status` (`Ready`, `Running`, `Success`, `Failed`)              |
//! | [`context`] | `TickContext`, the tick/time snapshot passed to every visit    |
//! | [`node`]    | `Node`, `Decorator`, `Cooldown`, leaf closure aliases           |
//! | [`builder`] | `TreeBuilder`, bottom-up construction with fail-fast checks    |
//! | [`tree`]    | `BehaviorTree` handle, `TreeSignal`, `TreeDump`                 |
//! | [`error`]   | `TreeError`, `TreeResult<T>`                                    |
//!
//! # Design notes
//!
//! A tree is an arena: a flat `Vec<Node<S>>` addressed by `NodeId`.  Parents
//! own their children as index lists; the child → parent link is a plain
//! index used only to walk upward when an Event node fires.  Node kinds are
//! one tagged enum dispatched by `match`, so there is no trait object per
//! node and no reference cycle anywhere.
//!
//! One update is three passes over the arena:
//!
//! 1. **Visit** from the root: every node kind sets its own status.
//! 2. **Commit**: every node copies `status` into `last_result`.
//! 3. **Step** from the root: finished subtrees reset to `Ready`, running
//!    ones forward the step to their children.
//!
//! Leaf closures receive `&mut S`, the per-agent state owned by the brain,
//! plus the [`TickContext`].  Nothing in a visit blocks: a leaf either
//! finishes within the call or reports `Running` and is visited again on a
//! later tick.

pub mod builder;
pub mod context;
pub mod error;
mod eval;
pub mod node;
pub mod status;
pub mod tree;

#[cfg(test)]
mod tests;

pub use builder::TreeBuilder;
pub use context::TickContext;
pub use error::{TreeError, TreeResult};
pub use node::{ActionFn, Cooldown, Decorator, DurationFn, Node, Predicate};
pub use status::Status;
pub use tree::{BehaviorTree, TreeDump, TreeSignal};
