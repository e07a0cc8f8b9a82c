//! Benchlist configuration.

use serde::{Deserialize, Serialize};
use web_time::Duration;

/// How long a bench lasts before it expires (24 hours).
pub const BENCH_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the benchlist manager.
///
/// Deserializes from an empty table, so it can be embedded in a larger node
/// configuration file without listing every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchlistConfig {
    /// Retained for configuration compatibility. Has no effect.
    pub deprecated: bool,
}

impl BenchlistConfig {
    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }
}
