//! Per-tick summary produced by the wrangler.

use std::fmt;

use bt_core::Tick;

/// What one scheduler pass did.  Partition sizes are taken after re-filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub tick:        Tick,
    /// Brains moved from their wake bucket into the active set.
    pub promoted:    usize,
    /// Brains whose update ran to completion.
    pub updated:     usize,
    /// Active brains whose agent was invalid or asleep.
    pub skipped:     usize,
    /// Brains whose update panicked.
    pub faulted:     usize,
    pub active:      usize,
    pub scheduled:   usize,
    pub hibernating: usize,
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: +{} promoted, {} updated, {} skipped, {} faulted | {}/{}/{} a/s/h",
            self.tick,
            self.promoted,
            self.updated,
            self.skipped,
            self.faulted,
            self.active,
            self.scheduled,
            self.hibernating,
        )
    }
}
