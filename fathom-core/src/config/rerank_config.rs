use serde::{Deserialize, Serialize};

use super::defaults;

/// Reranker chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Per-strategy timeout.
    pub timeout_ms: u64,
    /// Candidates below this score are dropped after a successful rerank.
    /// Applied only to reranked output, never to the inputs.
    pub min_score: f64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::DEFAULT_RERANK_TIMEOUT_MS,
            min_score: defaults::DEFAULT_MIN_RERANK_SCORE,
        }
    }
}
