//! Engine-wide error type.
//!
//! Sub-crates define their own error enums (`TreeError`, `ScheduleError`,
//! `SimError`) and wrap `BtError` as one variant where they need it.

use thiserror::Error;

use crate::{AgentId, BrainId};

/// The top-level error type for `bt-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum BtError {
    #[error("agent {0} has no brain")]
    AgentNotFound(AgentId),

    #[error("brain {0} not found")]
    BrainNotFound(BrainId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `bt-*` crates.
pub type BtResult<T> = Result<T, BtError>;
