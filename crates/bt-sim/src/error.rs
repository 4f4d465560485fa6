use bt_brain::BrainError;
use bt_core::BtError;
use bt_schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] BtError),

    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    #[error("scheduling error: {0}")]
    Schedule(#[from] ScheduleError),
}

pub type SimResult<T> = Result<T, SimError>;
