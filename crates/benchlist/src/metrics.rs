//! Benchlist metrics

use metrics::{Counter, Gauge};

/// Benchlist metrics.
///
/// `Default` registers against whichever recorder is installed; without one
/// every handle is a no-op.
#[derive(Clone, Debug)]
pub struct BenchlistMetrics {
    /// Number of bench events recorded
    pub(crate) benched_total: Counter,
    /// Number of bench entries removed by an unbench
    pub(crate) unbenched_total: Counter,
    /// Number of bench entries removed because they expired
    pub(crate) expired_total: Counter,
    /// Number of chains with a registered validator set
    pub(crate) registered_chains: Gauge,
}

impl Default for BenchlistMetrics {
    fn default() -> Self {
        Self {
            benched_total: metrics::counter!("benchlist.benched_total"),
            unbenched_total: metrics::counter!("benchlist.unbenched_total"),
            expired_total: metrics::counter!("benchlist.expired_total"),
            registered_chains: metrics::gauge!("benchlist.registered_chains"),
        }
    }
}

impl BenchlistMetrics {
    /// Metrics that are never recorded anywhere.
    pub fn noop() -> Self {
        Self {
            benched_total: Counter::noop(),
            unbenched_total: Counter::noop(),
            expired_total: Counter::noop(),
            registered_chains: Gauge::noop(),
        }
    }

    pub(crate) fn inc_benched(&self) {
        self.benched_total.increment(1);
    }

    pub(crate) fn inc_unbenched(&self) {
        self.unbenched_total.increment(1);
    }

    pub(crate) fn inc_expired(&self, count: usize) {
        if count > 0 {
            self.expired_total.increment(count as u64);
        }
    }

    pub(crate) fn set_registered_chains(&self, count: usize) {
        self.registered_chains.set(count as f64);
    }
}
