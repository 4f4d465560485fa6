//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `brain_snapshots.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{BrainSnapshotRow, OutputResult, TickSummaryRow};

/// Writes scheduler output to two CSV files.
pub struct CsvWriter {
    snapshots: Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut snapshots = Writer::from_path(dir.join("brain_snapshots.csv"))?;
        snapshots.write_record([
            "brain_id",
            "agent_id",
            "tick",
            "membership",
            "wake_tick",
            "root_status",
            "last_result",
            "sleep_ms",
        ])?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record([
            "tick",
            "time_ms",
            "promoted",
            "updated",
            "skipped",
            "faulted",
            "active",
            "scheduled",
            "hibernating",
        ])?;

        Ok(Self { snapshots, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[BrainSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.brain_id.to_string(),
                row.agent_id.to_string(),
                row.tick.to_string(),
                row.membership.to_owned(),
                row.wake_tick.to_string(),
                row.root_status.to_owned(),
                row.last_result.to_owned(),
                row.sleep_ms.map(|ms| ms.to_string()).unwrap_or_default(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.time_ms.to_string(),
            row.promoted.to_string(),
            row.updated.to_string(),
            row.skipped.to_string(),
            row.faulted.to_string(),
            row.active.to_string(),
            row.scheduled.to_string(),
            row.hibernating.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
