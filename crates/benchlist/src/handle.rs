//! Per-pair bench capability.
//!
//! A `BenchHandle` wraps an `Arc` of the registry state plus the (chain, node)
//! pair it was issued for. It is cheap to clone and stays valid for as long as
//! it is held, even after every manager clone has been dropped.

use std::sync::Arc;

use benchlist_ids::{ChainId, NodeId};

use crate::clock::{Clock, SystemClock};
use crate::error::BenchlistError;
use crate::manager::Shared;
use crate::traits::Benchable;

/// Capability to bench and unbench a single node on a single chain.
pub struct BenchHandle<C: Clock = SystemClock> {
    shared: Arc<Shared<C>>,
    chain: ChainId,
    node: NodeId,
}

impl<C: Clock> BenchHandle<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>, chain: ChainId, node: NodeId) -> Self {
        Self {
            shared,
            chain,
            node,
        }
    }

    /// Chain this handle is scoped to.
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Node this handle is scoped to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Bench the node from now on. Restarts the bench period if it was
    /// already benched.
    pub fn bench(&self) {
        self.shared.bench(self.chain, self.node);
    }

    /// Lift the bench. No-op if the node is not benched.
    pub fn unbench(&self) {
        self.shared.unbench(self.chain, self.node);
    }

    pub fn is_benched(&self) -> bool {
        self.shared.is_benched(&self.node, &self.chain)
    }

    fn check_scope(&self, chain: ChainId, node: NodeId) -> Result<(), BenchlistError> {
        if chain == self.chain && node == self.node {
            Ok(())
        } else {
            Err(BenchlistError::ScopeMismatch {
                expected_chain: self.chain,
                expected_node: self.node,
                chain,
                node,
            })
        }
    }
}

impl<C: Clock> Benchable for BenchHandle<C> {
    fn benched(&self, chain: ChainId, node: NodeId) -> Result<(), BenchlistError> {
        self.check_scope(chain, node)?;
        self.bench();
        Ok(())
    }

    fn unbenched(&self, chain: ChainId, node: NodeId) -> Result<(), BenchlistError> {
        self.check_scope(chain, node)?;
        self.unbench();
        Ok(())
    }
}

impl<C: Clock> Clone for BenchHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            chain: self.chain,
            node: self.node,
        }
    }
}

impl<C: Clock> std::fmt::Debug for BenchHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchHandle")
            .field("chain", &self.chain)
            .field("node", &self.node)
            .finish()
    }
}
