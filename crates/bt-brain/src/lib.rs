//! `bt-brain`: the per-agent controller that owns a behavior tree.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`brain`]   | `Brain`, state, tree, event handlers, lifecycle hooks    |
//! | [`builder`] | `BrainBuilder`, fluent construction                      |
//! | [`store`]   | `BrainStore`, `BrainId`-addressed slot storage           |
//! | [`error`]   | `BrainError`, `BrainResult<T>`                            |
//!
//! # Lifecycle
//!
//! ```text
//!   build ──► stopped ──start──► running ──stop──► stopped
//!                                  │  ▲
//!                            pause │  │ resume
//!                                  ▼  │
//!                                 paused   (start/stop are no-ops)
//! ```
//!
//! Scheduling is the wrangler's job (`bt-sim`); a brain only reports
//! whether a lifecycle call took effect.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                            |
//! |-----------|---------------------------------------------------|
//! | `serde`   | Forwards to `bt-core/serde` and `bt-tree/serde`.   |
//! | `fx-hash` | FxHash for the agent → brain index.                |

pub mod brain;
pub mod builder;
pub mod error;
pub mod store;


pub use brain::{Brain, BrainDump, EventHandler, Hook, UpdateHook};
pub use builder::BrainBuilder;
pub use error::{BrainError, BrainResult};
pub use store::BrainStore;
