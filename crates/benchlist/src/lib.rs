//! Per-chain benchlist: peers temporarily excluded from request routing.
//!
//! The [`BenchlistManager`] owns all bench state behind a single lock. Policy
//! components never touch that state directly; they obtain a [`BenchHandle`]
//! scoped to one (chain, node) pair and signal bench changes through it.
//! Routing code queries [`BenchlistManager::is_benched`] on the hot path.
//!
//! Bench entries expire [`BENCH_DURATION`] after they were recorded. Expiry is
//! lazy: an expired entry is deleted by the next query that observes it, and
//! [`BenchlistManager::compact_expired`] sweeps everything on demand.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use benchlist::{BenchlistManager, Benchable};
//!
//! let manager = BenchlistManager::with_defaults();
//! manager.register_chain(chain_id, Arc::new(validators));
//!
//! // Handed to the component that decides when a peer misbehaves
//! let handle = manager.benchable(chain_id, node_id);
//! handle.bench();
//!
//! assert!(manager.is_benched(&node_id, &chain_id));
//! ```

mod clock;
mod config;
mod error;
mod handle;
mod manager;
mod metrics;
mod traits;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
pub use config::{BENCH_DURATION, BenchlistConfig};
pub use error::BenchlistError;
pub use handle::BenchHandle;
pub use manager::{BenchlistManager, BenchlistStats};
pub use self::metrics::BenchlistMetrics;
pub use traits::{Benchable, BenchlistManagerApi};

pub use benchlist_ids::{ChainId, NodeId};
pub use benchlist_validators::{StaticValidatorSet, ValidatorSet};
