//! `bt-output`: scheduler output writers for the rust_bt engine.
//!
//! | Backend | Files created                                   |
//! |---------|-------------------------------------------------|
//! | CSV     | `brain_snapshots.csv`, `tick_summaries.csv`     |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`WranglerOutputObserver`], which implements `bt_sim::WranglerObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bt_output::{CsvWriter, WranglerOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = WranglerOutputObserver::new(writer, &config);
//! wrangler.run(&host, &mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::WranglerOutputObserver;
pub use row::{BrainSnapshotRow, TickSummaryRow};
pub use writer::OutputWriter;
