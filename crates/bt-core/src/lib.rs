//! `bt-core`: foundational types for the `rust_bt` behavior-tree engine.
//!
//! This crate is a dependency of every other `bt-*` crate.  It has no `bt-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `BrainId`, `NodeId`                        |
//! | [`time`]        | `Tick`, `SimClock`, `WranglerConfig`                  |
//! | [`rng`]         | `AgentRng` (per-tree deterministic RNG)               |
//! | [`host`]        | `AgentHost`, `EventSource`, `EventData`, `NullHost`   |
//! | [`error`]       | `BtError`, `BtResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, `Tick`, config.     |

pub mod error;
pub mod host;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{BtError, BtResult};
pub use host::{AgentHost, EventData, EventSource, NullHost};
pub use ids::{AgentId, BrainId, NodeId};
pub use rng::AgentRng;
pub use time::{SimClock, Tick, WranglerConfig};
