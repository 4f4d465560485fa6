//! The `OutputWriter` trait implemented by backend writers.

use crate::{BrainSnapshotRow, OutputResult, TickSummaryRow};

/// Trait implemented by output backends.
///
/// All methods are infallible from the observer's perspective: errors are
/// stored internally and retrieved with
/// [`WranglerOutputObserver::take_error`](crate::WranglerOutputObserver::take_error).
pub trait OutputWriter {
    /// Write a batch of brain snapshots.
    fn write_snapshots(&mut self, rows: &[BrainSnapshotRow]) -> OutputResult<()>;

    /// Write one tick summary row.
    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
