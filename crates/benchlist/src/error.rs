use benchlist_ids::{ChainId, NodeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchlistError {
    /// A handle was asked to act on a pair other than the one it is scoped to.
    #[error(
        "handle scoped to node {expected_node} on chain {expected_chain}, called for node {node} on chain {chain}"
    )]
    ScopeMismatch {
        expected_chain: ChainId,
        expected_node: NodeId,
        chain: ChainId,
        node: NodeId,
    },
}
