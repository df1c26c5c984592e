use serde::{Deserialize, Serialize};

use super::defaults;

/// Circuit breaker configuration, shared by all named breakers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failures within the rolling window before the circuit opens.
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before allowing a probe.
    pub recovery_timeout_secs: u64,
    /// Trial calls allowed while half-open.
    pub half_open_max_calls: u32,
    /// Rolling window in which failures count toward the threshold.
    pub failure_window_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout_secs: defaults::DEFAULT_RECOVERY_TIMEOUT_SECS,
            half_open_max_calls: defaults::DEFAULT_HALF_OPEN_MAX_CALLS,
            failure_window_secs: defaults::DEFAULT_FAILURE_WINDOW_SECS,
        }
    }
}
