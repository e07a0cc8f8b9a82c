//! Validator set abstraction.
//!
//! The benchlist stores one [`ValidatorSet`] per chain but never inspects it.
//! Consumers that weight bench decisions by stake look the set up through the
//! registry and query it directly.

use std::collections::HashMap;
use std::fmt::Debug;

use auto_impl::auto_impl;
use benchlist_ids::NodeId;

/// Read-only view of the validators entitled to participate on a chain.
#[auto_impl(&, Box, Arc)]
pub trait ValidatorSet: Debug + Send + Sync {
    /// Number of validators in the set.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, node: &NodeId) -> bool;

    /// Stake weight of `node`, zero if it is not a validator.
    fn weight(&self, node: &NodeId) -> u64;

    /// Sum of all validator weights (saturating).
    fn total_weight(&self) -> u64;
}

/// Fixed validator set backed by a map of node to stake weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticValidatorSet {
    weights: HashMap<NodeId, u64>,
    total_weight: u64,
}

impl StaticValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator, replacing its previous weight if already present.
    pub fn with_validator(mut self, node: NodeId, weight: u64) -> Self {
        self.insert(node, weight);
        self
    }

    /// Insert or replace a validator. Returns the previous weight.
    pub fn insert(&mut self, node: NodeId, weight: u64) -> Option<u64> {
        let previous = self.weights.insert(node, weight);
        self.recompute_total();
        previous
    }

    pub fn remove(&mut self, node: &NodeId) -> Option<u64> {
        let removed = self.weights.remove(node);
        if removed.is_some() {
            self.recompute_total();
        }
        removed
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.weights.keys()
    }

    fn recompute_total(&mut self) {
        self.total_weight = self
            .weights
            .values()
            .fold(0u64, |acc, w| acc.saturating_add(*w));
    }
}

impl FromIterator<(NodeId, u64)> for StaticValidatorSet {
    fn from_iter<I: IntoIterator<Item = (NodeId, u64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (node, weight) in iter {
            set.weights.insert(node, weight);
        }
        set.recompute_total();
        set
    }
}

impl ValidatorSet for StaticValidatorSet {
    fn len(&self) -> usize {
        self.weights.len()
    }

    fn contains(&self, node: &NodeId) -> bool {
        self.weights.contains_key(node)
    }

    fn weight(&self, node: &NodeId) -> u64 {
        self.weights.get(node).copied().unwrap_or(0)
    }

    fn total_weight(&self) -> u64 {
        self.total_weight
    }
}
