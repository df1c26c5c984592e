use serde::{Deserialize, Serialize};

use super::defaults;

/// Rank fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// RRF smoothing constant. Higher k damps rank-1 dominance.
    pub rrf_k: u32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rrf_k: defaults::DEFAULT_RRF_K,
        }
    }
}
