//! `bt-sim`: the tick scheduler ("brain wrangler") for the rust_bt engine.
//!
//! # Tick loop
//!
//! ```text
//! for tick in now..config.total_ticks:
//!   ① Promote: drain every wake bucket at or before `tick` into the
//!               active set.
//!   ② Update:  for each active brain in ascending BrainId order:
//!                 agent invalid / asleep → skip (stays active)
//!                 otherwise              → brain.update(ctx) under catch_unwind
//!   ③ Re-file: map the tree's sleep time onto the tick grid:
//!                 Some(0)  → stay active
//!                 Some(d)  → bucket at tick + ceil(d / tick_duration)
//!                 None     → hibernate until woken
//! ```
//!
//! Event delivery (`deliver_event`, `trigger_event`) and `force_update`
//! move a brain straight back into the active set between ticks.
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                  |
//! |-----------|---------------------------------------------------------|
//! | `serde`   | Forwards to the `serde` features of the lower crates.   |
//! | `fx-hash` | FxHash for the membership and agent indexes.            |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use bt_core::{NullHost, WranglerConfig};
//! use bt_sim::{NoopObserver, WranglerBuilder};
//!
//! let mut wrangler = WranglerBuilder::new(config).brains(brains).build()?;
//! wrangler.start_all(&mut NullHost)?;
//! wrangler.run(&NullHost, &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod report;
pub mod wrangler;


pub use builder::WranglerBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, WranglerObserver};
pub use report::TickReport;
pub use wrangler::Wrangler;
