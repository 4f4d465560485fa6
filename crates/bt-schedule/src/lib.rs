//! `bt-schedule`: the tick-bucket index behind the brain wrangler.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`wake_queue`] | `WakeQueue` (`BTreeMap<Tick, BTreeSet<BrainId>>`)          |
//! | [`registry`]   | `Registry`, `Membership` (active / scheduled / hibernating)|
//! | [`sleep`]      | `SleepRequest`, tree sleep time → scheduling decision     |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                       |
//!
//! # Scheduling model (summary)
//!
//! After a brain's update the wrangler asks its tree how long it may sleep:
//!
//! ```text
//! None            → hibernating  (until an explicit wake)
//! Some(0)         → active       (update again next tick)
//! Some(d > 0)     → scheduled at now + ceil(d / tick_duration), min 1 tick
//! ```
//!
//! At the start of tick `t` every bucket at or before `t` is drained back
//! into the active set, so only due brains are ever touched.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `serde`   | Adds `Serialize`/`Deserialize` to `Membership`.          |
//! | `fx-hash` | FxHash for the membership index.                         |

pub mod error;
pub mod registry;
pub mod sleep;
pub mod wake_queue;


pub use error::{ScheduleError, ScheduleResult};
pub use registry::{Membership, Registry};
pub use sleep::SleepRequest;
pub use wake_queue::WakeQueue;
