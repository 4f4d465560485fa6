//! Node status.

use std::fmt;

/// The state of one node.
///
/// `Ready` means "not started / reset"; a node only leaves it when visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    #[default]
    Ready,
    Running,
    Success,
    Failed,
}

impl Status {
    /// `true` for `Success` and `Failed`.
    #[inline]
    pub fn is_done(self) -> bool {
        matches!(self, Status::Success | Status::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ready   => "READY",
            Status::Running => "RUNNING",
            Status::Success => "SUCCESS",
            Status::Failed  => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
