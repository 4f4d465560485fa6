use bt_core::BrainId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("brain {0} is already registered")]
    AlreadyRegistered(BrainId),

    #[error("brain {0} is not registered")]
    NotRegistered(BrainId),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
