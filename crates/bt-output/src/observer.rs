//! `WranglerOutputObserver<W>`: bridges `WranglerObserver` to an
//! `OutputWriter`.

use bt_brain::{Brain, BrainStore};
use bt_core::{BrainId, SimClock, Tick, WranglerConfig};
use bt_schedule::{Membership, Registry};
use bt_sim::{TickReport, WranglerObserver};

use crate::row::{BrainSnapshotRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`WranglerObserver`] that writes brain snapshots and tick summaries to
/// any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After `wrangler.run()` returns, check for errors
/// with [`take_error`][Self::take_error].
pub struct WranglerOutputObserver<W: OutputWriter> {
    writer:     W,
    clock:      SimClock,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> WranglerOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` for tick → time
    /// conversion.
    pub fn new(writer: W, config: &WranglerConfig) -> Self {
        Self {
            writer,
            clock:      config.make_clock(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `wrangler.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }

    fn snapshot_row<S>(&self, tick: Tick, id: BrainId, brain: &Brain<S>, registry: &Registry) -> BrainSnapshotRow {
        let membership = registry.membership(id);
        let label = match membership {
            Some(m) => m.as_str(),
            None if brain.is_paused() => "paused",
            None => "stopped",
        };
        let wake_tick = match membership {
            Some(Membership::Scheduled(t)) => t.0,
            _ => u64::MAX,
        };
        let (root_status, last_result) = match brain.tree() {
            Some(tree) => (tree.root_status().as_str(), tree.last_result().as_str()),
            None => ("NONE", "NONE"),
        };
        let sleep_ms = brain
            .sleep_time(self.clock.time_at(tick))
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));

        BrainSnapshotRow {
            brain_id: id.0,
            agent_id: brain.agent().0,
            tick: tick.0,
            membership: label,
            wake_tick,
            root_status,
            last_result,
            sleep_ms,
        }
    }
}

impl<S, W: OutputWriter> WranglerObserver<S> for WranglerOutputObserver<W> {
    fn on_tick_end(&mut self, report: &TickReport) {
        let time_ms = self.clock.time_at(report.tick).as_millis();
        let row = TickSummaryRow {
            tick:        report.tick.0,
            time_ms:     u64::try_from(time_ms).unwrap_or(u64::MAX),
            promoted:    report.promoted as u64,
            updated:     report.updated as u64,
            skipped:     report.skipped as u64,
            faulted:     report.faulted as u64,
            active:      report.active as u64,
            scheduled:   report.scheduled as u64,
            hibernating: report.hibernating as u64,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, brains: &BrainStore<S>, registry: &Registry) {
        let rows: Vec<BrainSnapshotRow> = brains
            .iter()
            .map(|(id, brain)| self.snapshot_row(tick, id, brain, registry))
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
