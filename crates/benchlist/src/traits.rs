//! Abstract registry and capability interfaces.

use std::collections::HashSet;
use std::sync::Arc;

use auto_impl::auto_impl;
use benchlist_ids::{ChainId, NodeId};
use benchlist_validators::ValidatorSet;

use crate::error::BenchlistError;

/// Registry of benched nodes, one bench map per chain.
///
/// Consumers that gate request routing should depend on this trait rather
/// than on [`BenchlistManager`](crate::BenchlistManager) so tests can inject
/// their own registry.
#[auto_impl(&, Arc)]
pub trait BenchlistManagerApi: Send + Sync {
    /// Capability returned by [`benchable`](Self::benchable).
    type Handle: Benchable;

    /// Whether `node` is currently benched on `chain`. Drops an expired entry
    /// if it finds one.
    fn is_benched(&self, node: &NodeId, chain: &ChainId) -> bool;

    /// All nodes currently benched on `chain`, in no particular order.
    fn get_benched(&self, chain: &ChainId) -> HashSet<NodeId>;

    /// Associate `validators` with `chain`, replacing any previous set.
    fn register_chain(&self, chain: ChainId, validators: Arc<dyn ValidatorSet>);

    /// Capability to bench and unbench `node` on `chain`.
    fn benchable(&self, chain: ChainId, node: NodeId) -> Self::Handle;
}

/// Permission to change the bench state of a single (chain, node) pair.
///
/// Both methods take the pair explicitly and reject any pair other than the
/// one the capability was issued for.
pub trait Benchable: Send + Sync {
    fn benched(&self, chain: ChainId, node: NodeId) -> Result<(), BenchlistError>;

    fn unbenched(&self, chain: ChainId, node: NodeId) -> Result<(), BenchlistError>;
}
