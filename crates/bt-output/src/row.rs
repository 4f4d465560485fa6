//! Plain data row types written by output backends.

/// One brain's scheduling and tree state at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrainSnapshotRow {
    pub brain_id:    u32,
    pub agent_id:    u32,
    pub tick:        u64,
    /// `active`, `scheduled`, `hibernating`, `paused` or `stopped`.
    pub membership:  &'static str,
    /// Wake tick while scheduled; `u64::MAX` otherwise.
    pub wake_tick:   u64,
    /// Root status, `NONE` for a brain without a tree.
    pub root_status: &'static str,
    pub last_result: &'static str,
    /// Requested sleep in milliseconds; `None` means "may hibernate".
    pub sleep_ms:    Option<u64>,
}

/// Summary statistics for one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:        u64,
    /// Simulated time at `tick`.
    pub time_ms:     u64,
    pub promoted:    u64,
    pub updated:     u64,
    pub skipped:     u64,
    pub faulted:     u64,
    pub active:      u64,
    pub scheduled:   u64,
    pub hibernating: u64,
}
