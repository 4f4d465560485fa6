use bt_core::AgentId;
use bt_tree::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrainError {
    #[error("agent {0} already has a brain")]
    AgentHasBrain(AgentId),

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
}

pub type BrainResult<T> = Result<T, BrainError>;
