//! Central benchlist registry.
//!
//! All bench timestamps and validator-set references live in one map pair
//! guarded by a single `RwLock`. Queries take the read lock; only a query that
//! finds an expired entry re-acquires the lock for writing to delete it,
//! re-checking the entry first since it may have been re-benched in between.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use benchlist_ids::{ChainId, NodeId};
use benchlist_validators::ValidatorSet;
use parking_lot::RwLock;
use tracing::{Span, debug, info, info_span, trace};
use web_time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::config::{BENCH_DURATION, BenchlistConfig};
use crate::handle::BenchHandle;
use crate::metrics::BenchlistMetrics;
use crate::traits::BenchlistManagerApi;

/// chain -> node -> instant the node was benched.
type BenchMap = HashMap<ChainId, HashMap<NodeId, Instant>>;

/// Whether a bench recorded at `benched_at` is still in force at `now`.
fn is_live(benched_at: Instant, now: Instant) -> bool {
    now.saturating_duration_since(benched_at) < BENCH_DURATION
}

#[derive(Debug, Default)]
struct BenchState {
    benched: BenchMap,
    validators: HashMap<ChainId, Arc<dyn ValidatorSet>>,
}

/// State shared between the manager and every handle it issues.
#[derive(Debug)]
pub(crate) struct Shared<C> {
    state: RwLock<BenchState>,
    clock: C,
    span: Span,
    metrics: BenchlistMetrics,
}

impl<C: Clock> Shared<C> {
    /// Record `node` as benched on `chain` from now, resetting any earlier bench.
    pub(crate) fn bench(&self, chain: ChainId, node: NodeId) {
        let now = self.clock.now();
        self.state
            .write()
            .benched
            .entry(chain)
            .or_default()
            .insert(node, now);

        self.metrics.inc_benched();
        info!(parent: &self.span, node_id = %node, chain_id = %chain, "node benched");
    }

    pub(crate) fn unbench(&self, chain: ChainId, node: NodeId) {
        let (chain_known, removed) = {
            let mut state = self.state.write();
            match state.benched.get_mut(&chain) {
                Some(nodes) => (true, nodes.remove(&node).is_some()),
                None => (false, false),
            }
        };

        if removed {
            self.metrics.inc_unbenched();
        }
        if chain_known {
            info!(parent: &self.span, node_id = %node, chain_id = %chain, "node unbenched");
        }
    }

    pub(crate) fn is_benched(&self, node: &NodeId, chain: &ChainId) -> bool {
        let now = self.clock.now();

        // Fast path: read lock
        {
            let state = self.state.read();
            match state.benched.get(chain).and_then(|nodes| nodes.get(node)) {
                None => return false,
                Some(benched_at) if is_live(*benched_at, now) => return true,
                Some(_) => {}
            }
        }

        // Slow path: the entry looked expired, delete it under the write lock
        let mut state = self.state.write();
        let Some(nodes) = state.benched.get_mut(chain) else {
            return false;
        };
        // Re-check: the node may have been unbenched or re-benched in between
        match nodes.get(node) {
            None => return false,
            Some(benched_at) if is_live(*benched_at, now) => return true,
            Some(_) => {}
        }
        nodes.remove(node);
        drop(state);

        self.metrics.inc_expired(1);
        debug!(parent: &self.span, node_id = %node, chain_id = %chain, "bench expired");
        false
    }
}

/// Registry of benched nodes per chain.
///
/// Cheap to clone: clones share the same state. Mutation goes exclusively
/// through [`BenchHandle`]s obtained from [`benchable`](Self::benchable).
pub struct BenchlistManager<C: Clock = SystemClock> {
    shared: Arc<Shared<C>>,
    config: BenchlistConfig,
}

impl BenchlistManager<SystemClock> {
    /// Create a manager logging under `span` and recording into `metrics`.
    pub fn new(span: Span, metrics: BenchlistMetrics, config: BenchlistConfig) -> Self {
        Self::with_clock(span, metrics, config, SystemClock)
    }

    /// Manager with a `benchlist` span, default metrics and default config.
    pub fn with_defaults() -> Self {
        Self::new(
            info_span!("benchlist"),
            BenchlistMetrics::default(),
            BenchlistConfig::default(),
        )
    }
}

impl Default for BenchlistManager<SystemClock> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<C: Clock> BenchlistManager<C> {
    /// Create a manager reading time from `clock`.
    pub fn with_clock(
        span: Span,
        metrics: BenchlistMetrics,
        config: BenchlistConfig,
        clock: C,
    ) -> Self {
        debug!(parent: &span, deprecated = config.deprecated, "benchlist manager created");
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(BenchState::default()),
                clock,
                span,
                metrics,
            }),
            config,
        }
    }

    pub fn config(&self) -> &BenchlistConfig {
        &self.config
    }

    /// Associate `validators` with `chain` and make sure a bench map exists
    /// for it. A later call for the same chain replaces the validator set and
    /// leaves existing bench entries in place.
    pub fn register_chain(&self, chain: ChainId, validators: Arc<dyn ValidatorSet>) {
        let registered = {
            let mut state = self.shared.state.write();
            state.validators.insert(chain, validators);
            state.benched.entry(chain).or_default();
            state.validators.len()
        };

        self.shared.metrics.set_registered_chains(registered);
        debug!(parent: &self.shared.span, chain_id = %chain, "chain registered");
    }

    /// Validator set registered for `chain`.
    pub fn validators(&self, chain: &ChainId) -> Option<Arc<dyn ValidatorSet>> {
        self.shared.state.read().validators.get(chain).cloned()
    }

    /// Chains with a registered validator set.
    pub fn registered_chains(&self) -> Vec<ChainId> {
        self.shared.state.read().validators.keys().copied().collect()
    }

    /// Whether `node` is currently benched on `chain`.
    ///
    /// An entry older than [`BENCH_DURATION`] is removed and reported as not
    /// benched. Unknown chains are never benched.
    pub fn is_benched(&self, node: &NodeId, chain: &ChainId) -> bool {
        self.shared.is_benched(node, chain)
    }

    /// All nodes currently benched on `chain`.
    ///
    /// Expired entries found during the scan are removed as well.
    pub fn get_benched(&self, chain: &ChainId) -> HashSet<NodeId> {
        let now = self.shared.clock.now();

        // Fast path: nothing expired, answer under the read lock
        {
            let state = self.shared.state.read();
            let Some(nodes) = state.benched.get(chain) else {
                return HashSet::new();
            };
            if nodes.values().all(|benched_at| is_live(*benched_at, now)) {
                return nodes.keys().copied().collect();
            }
        }

        let mut state = self.shared.state.write();
        let Some(nodes) = state.benched.get_mut(chain) else {
            return HashSet::new();
        };
        let before = nodes.len();
        nodes.retain(|_, benched_at| is_live(*benched_at, now));
        let expired = before - nodes.len();
        let live = nodes.keys().copied().collect();
        drop(state);

        self.shared.metrics.inc_expired(expired);
        trace!(parent: &self.shared.span, chain_id = %chain, expired, "dropped expired benches");
        live
    }

    /// Capability to bench and unbench `node` on `chain`.
    ///
    /// Has no side effects; the chain does not need to be registered.
    pub fn benchable(&self, chain: ChainId, node: NodeId) -> BenchHandle<C> {
        BenchHandle::new(Arc::clone(&self.shared), chain, node)
    }

    /// Raw bench timestamp for `node` on `chain`, expired or not.
    pub fn benched_at(&self, node: &NodeId, chain: &ChainId) -> Option<Instant> {
        self.shared
            .state
            .read()
            .benched
            .get(chain)
            .and_then(|nodes| nodes.get(node))
            .copied()
    }

    /// Remove every expired entry on every chain. Returns the number removed.
    ///
    /// Lazy expiry only reclaims entries that are queried again; this is for
    /// callers that want to bound memory held by abandoned entries.
    pub fn compact_expired(&self) -> usize {
        let now = self.shared.clock.now();
        let removed = {
            let mut state = self.shared.state.write();
            state
                .benched
                .values_mut()
                .map(|nodes| {
                    let before = nodes.len();
                    nodes.retain(|_, benched_at| is_live(*benched_at, now));
                    before - nodes.len()
                })
                .sum()
        };

        self.shared.metrics.inc_expired(removed);
        if removed > 0 {
            debug!(parent: &self.shared.span, removed, "compacted expired benches");
        }
        removed
    }

    /// Get statistics about the benchlist state.
    pub fn stats(&self) -> BenchlistStats {
        let now = self.shared.clock.now();
        let state = self.shared.state.read();

        let entries = state.benched.values().map(HashMap::len).sum();
        let benched = state
            .benched
            .values()
            .flat_map(|nodes| nodes.values())
            .filter(|benched_at| is_live(**benched_at, now))
            .count();

        BenchlistStats {
            chains: state.benched.len(),
            registered_chains: state.validators.len(),
            entries,
            benched,
        }
    }
}

impl<C: Clock> Clone for BenchlistManager<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
        }
    }
}

impl<C: Clock> std::fmt::Debug for BenchlistManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchlistManager")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<C: Clock> BenchlistManagerApi for BenchlistManager<C> {
    type Handle = BenchHandle<C>;

    fn is_benched(&self, node: &NodeId, chain: &ChainId) -> bool {
        self.shared.is_benched(node, chain)
    }

    fn get_benched(&self, chain: &ChainId) -> HashSet<NodeId> {
        Self::get_benched(self, chain)
    }

    fn register_chain(&self, chain: ChainId, validators: Arc<dyn ValidatorSet>) {
        Self::register_chain(self, chain, validators)
    }

    fn benchable(&self, chain: ChainId, node: NodeId) -> Self::Handle {
        Self::benchable(self, chain, node)
    }
}

/// Statistics about the benchlist state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BenchlistStats {
    /// Chains with a bench map (registered or touched by a handle).
    pub chains: usize,
    /// Chains with a registered validator set.
    pub registered_chains: usize,
    /// Stored bench entries, including expired ones not yet removed.
    pub entries: usize,
    /// Entries still in force.
    pub benched: usize,
}

#[cfg(test)]
mod tests {
    use benchlist_validators::StaticValidatorSet;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use proptest::prelude::*;
    use web_time::Duration;

    use super::*;
    use crate::clock::MockClock;
    use crate::traits::Benchable;

    fn chain(n: u8) -> ChainId {
        ChainId::repeat_byte(n)
    }

    fn node(n: u8) -> NodeId {
        NodeId::repeat_byte(n)
    }

    fn validators(nodes: &[u8]) -> Arc<dyn ValidatorSet> {
        Arc::new(nodes.iter().map(|n| (node(*n), 1)).collect::<StaticValidatorSet>())
    }

    fn test_manager() -> (BenchlistManager<MockClock>, MockClock) {
        let clock = MockClock::new();
        let manager = BenchlistManager::with_clock(
            Span::none(),
            BenchlistMetrics::noop(),
            BenchlistConfig::default(),
            clock.clone(),
        );
        (manager, clock)
    }

    #[test]
    fn test_untouched_pair_not_benched() {
        let (manager, _) = test_manager();

        assert!(!manager.is_benched(&node(1), &chain(1)));
        assert!(manager.get_benched(&chain(1)).is_empty());

        manager.register_chain(chain(1), validators(&[1]));
        assert!(!manager.is_benched(&node(1), &chain(1)));
        assert!(manager.get_benched(&chain(1)).is_empty());
    }

    #[test]
    fn test_bench_and_unbench() {
        let (manager, _) = test_manager();
        manager.register_chain(chain(1), validators(&[1, 2]));

        let handle = manager.benchable(chain(1), node(1));
        handle.bench();

        assert!(manager.is_benched(&node(1), &chain(1)));
        assert!(!manager.is_benched(&node(2), &chain(1)));
        assert_eq!(manager.get_benched(&chain(1)), HashSet::from([node(1)]));

        handle.unbench();
        assert!(!manager.is_benched(&node(1), &chain(1)));
        assert!(manager.get_benched(&chain(1)).is_empty());
    }

    #[test]
    fn test_bench_is_per_chain() {
        let (manager, _) = test_manager();

        manager.benchable(chain(1), node(1)).bench();

        assert!(manager.is_benched(&node(1), &chain(1)));
        assert!(!manager.is_benched(&node(1), &chain(2)));
        assert!(manager.get_benched(&chain(2)).is_empty());
    }

    #[test]
    fn test_expired_bench_is_removed_on_query() {
        let (manager, clock) = test_manager();
        manager.register_chain(chain(1), validators(&[1]));
        manager.benchable(chain(1), node(1)).bench();

        clock.advance(BENCH_DURATION - Duration::from_secs(1));
        assert!(manager.is_benched(&node(1), &chain(1)));

        clock.advance(Duration::from_secs(2));
        // Still stored until something observes it
        assert!(manager.benched_at(&node(1), &chain(1)).is_some());
        assert!(!manager.is_benched(&node(1), &chain(1)));
        assert!(manager.benched_at(&node(1), &chain(1)).is_none());
    }

    #[test]
    fn test_bench_expires_exactly_at_duration() {
        let (manager, clock) = test_manager();
        manager.benchable(chain(1), node(1)).bench();

        clock.advance(BENCH_DURATION);
        assert!(!manager.is_benched(&node(1), &chain(1)));
    }

    #[test]
    fn test_rebench_resets_timer() {
        let (manager, clock) = test_manager();
        let handle = manager.benchable(chain(1), node(1));

        handle.bench();
        clock.advance(Duration::from_secs(20 * 60 * 60));
        handle.bench();
        clock.advance(Duration::from_secs(10 * 60 * 60));

        // First bench would have expired by now, the second has not
        assert!(manager.is_benched(&node(1), &chain(1)));
        assert_eq!(manager.get_benched(&chain(1)), HashSet::from([node(1)]));
    }

    #[test]
    fn test_get_benched_drops_expired_entries() {
        let (manager, clock) = test_manager();
        manager.benchable(chain(1), node(1)).bench();
        clock.advance(Duration::from_secs(12 * 60 * 60));
        manager.benchable(chain(1), node(2)).bench();
        clock.advance(Duration::from_secs(13 * 60 * 60));

        assert_eq!(manager.get_benched(&chain(1)), HashSet::from([node(2)]));
        assert!(manager.benched_at(&node(1), &chain(1)).is_none());
        assert!(manager.benched_at(&node(2), &chain(1)).is_some());
    }

    #[test]
    fn test_register_chain_replaces_validators_and_keeps_benches() {
        let (manager, _) = test_manager();
        manager.register_chain(chain(1), validators(&[1]));
        manager.benchable(chain(1), node(1)).bench();

        manager.register_chain(chain(1), validators(&[2, 3]));

        let current = manager.validators(&chain(1)).unwrap();
        assert_eq!(current.len(), 2);
        assert!(current.contains(&node(3)));
        assert!(!current.contains(&node(1)));
        assert!(manager.is_benched(&node(1), &chain(1)));
        assert_eq!(manager.registered_chains(), vec![chain(1)]);
    }

    #[test]
    fn test_register_chain_creates_empty_bench_map() {
        let (manager, _) = test_manager();
        assert_eq!(manager.stats().chains, 0);

        manager.register_chain(chain(1), validators(&[]));
        let stats = manager.stats();
        assert_eq!(stats.chains, 1);
        assert_eq!(stats.registered_chains, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_handle_for_unregistered_chain() {
        let (manager, _) = test_manager();

        manager.benchable(chain(9), node(1)).bench();

        assert!(manager.is_benched(&node(1), &chain(9)));
        assert!(manager.validators(&chain(9)).is_none());
        assert!(manager.registered_chains().is_empty());
        assert_eq!(manager.stats().chains, 1);
    }

    #[test]
    fn test_unbench_unknown_is_noop() {
        let (manager, _) = test_manager();

        manager.benchable(chain(1), node(1)).unbench();
        assert_eq!(manager.stats(), BenchlistStats::default());

        manager.register_chain(chain(1), validators(&[1]));
        manager.benchable(chain(1), node(1)).unbench();
        assert!(!manager.is_benched(&node(1), &chain(1)));
    }

    #[test]
    fn test_compact_expired() {
        let (manager, clock) = test_manager();
        for n in 1..=3 {
            manager.benchable(chain(1), node(n)).bench();
            manager.benchable(chain(2), node(n)).bench();
        }
        clock.advance(BENCH_DURATION);
        manager.benchable(chain(2), node(4)).bench();

        let stats = manager.stats();
        assert_eq!(stats.entries, 7);
        assert_eq!(stats.benched, 1);

        assert_eq!(manager.compact_expired(), 6);
        assert_eq!(manager.compact_expired(), 0);

        let stats = manager.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.chains, 2);
        assert!(manager.is_benched(&node(4), &chain(2)));
    }

    #[test]
    fn test_clones_share_state() {
        let (manager, _) = test_manager();
        let other = manager.clone();

        manager.benchable(chain(1), node(1)).bench();
        assert!(other.is_benched(&node(1), &chain(1)));
    }

    #[test]
    fn test_api_trait_through_arc() {
        let (manager, _) = test_manager();
        let api: Arc<BenchlistManager<MockClock>> = Arc::new(manager);

        fn route<M: BenchlistManagerApi>(registry: &M, node: NodeId, chain: ChainId) -> bool {
            !registry.is_benched(&node, &chain)
        }

        BenchlistManagerApi::register_chain(&api, chain(1), validators(&[1]));
        let handle = BenchlistManagerApi::benchable(&api, chain(1), node(1));
        handle.benched(chain(1), node(1)).unwrap();

        assert!(!route(&api, node(1), chain(1)));
        assert!(route(&api, node(2), chain(1)));
        assert_eq!(
            BenchlistManagerApi::get_benched(&api, &chain(1)),
            HashSet::from([node(1)])
        );
    }

    #[test]
    fn test_metrics_recorded() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let metrics = ::metrics::with_local_recorder(&recorder, BenchlistMetrics::default);

        let clock = MockClock::new();
        let manager = BenchlistManager::with_clock(
            Span::none(),
            metrics,
            BenchlistConfig::default(),
            clock.clone(),
        );
        manager.register_chain(chain(1), validators(&[1]));
        manager.benchable(chain(1), node(1)).bench();
        manager.benchable(chain(1), node(2)).bench();
        manager.benchable(chain(1), node(1)).unbench();
        clock.advance(BENCH_DURATION);
        assert!(!manager.is_benched(&node(2), &chain(1)));

        let values: HashMap<String, DebugValue> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, value)| (key.key().name().to_string(), value))
            .collect();

        assert_eq!(values.get("benchlist.benched_total"), Some(&DebugValue::Counter(2)));
        assert_eq!(values.get("benchlist.unbenched_total"), Some(&DebugValue::Counter(1)));
        assert_eq!(values.get("benchlist.expired_total"), Some(&DebugValue::Counter(1)));
        assert!(matches!(
            values.get("benchlist.registered_chains"),
            Some(DebugValue::Gauge(v)) if v.into_inner() == 1.0
        ));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Bench(u8),
        Unbench(u8),
        Advance(u64),
        Query(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4).prop_map(Op::Bench),
            (0u8..4).prop_map(Op::Unbench),
            (0u64..13).prop_map(Op::Advance),
            (0u8..4).prop_map(Op::Query),
        ]
    }

    fn model_live(model: &HashMap<NodeId, Duration>, n: &NodeId, now: Duration) -> bool {
        model.get(n).is_some_and(|at| now - *at < BENCH_DURATION)
    }

    proptest! {
        #[test]
        fn test_matches_reference_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let (manager, clock) = test_manager();
            let c = chain(1);
            // node -> elapsed time at which it was benched
            let mut model: HashMap<NodeId, Duration> = HashMap::new();

            for op in ops {
                match op {
                    Op::Bench(n) => {
                        manager.benchable(c, node(n)).bench();
                        model.insert(node(n), clock.elapsed());
                    }
                    Op::Unbench(n) => {
                        manager.benchable(c, node(n)).unbench();
                        model.remove(&node(n));
                    }
                    Op::Advance(hours) => clock.advance(Duration::from_secs(hours * 60 * 60)),
                    Op::Query(n) => {
                        let expected = model_live(&model, &node(n), clock.elapsed());
                        prop_assert_eq!(manager.is_benched(&node(n), &c), expected);
                    }
                }
            }

            let now = clock.elapsed();
            let expected: HashSet<NodeId> = model
                .keys()
                .filter(|n| model_live(&model, n, now))
                .copied()
                .collect();
            prop_assert_eq!(manager.get_benched(&c), expected);
        }
    }
}
