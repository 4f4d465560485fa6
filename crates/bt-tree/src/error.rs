use bt_core::NodeId;
use thiserror::Error;

/// Tree construction errors.  All of them surface from [`TreeBuilder`]
/// before a tree ever runs.
///
/// [`TreeBuilder`]: crate::TreeBuilder
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("{kind} node needs exactly {expected} child, got {got}")]
    WrongChildCount {
        kind:     &'static str,
        expected: usize,
        got:      usize,
    },

    #[error("{kind} node needs at least one child")]
    NoChildren { kind: &'static str },

    #[error("node {0} does not exist in this builder")]
    UnknownNode(NodeId),

    #[error("node {0} already has a parent")]
    AlreadyParented(NodeId),

    #[error("node {0} is not reachable from the root")]
    Orphan(NodeId),

    #[error("root node {0} is attached to a parent")]
    RootHasParent(NodeId),

    #[error("priority period must be non-zero")]
    ZeroPeriod,
}

pub type TreeResult<T> = Result<T, TreeError>;
