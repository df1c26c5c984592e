use serde::{Deserialize, Serialize};

use super::defaults;

/// Orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default result count when the query does not specify one.
    pub default_top_k: usize,
    /// Per-source timeout for retriever fan-out.
    pub source_timeout_ms: u64,
    /// Rerank candidate cap as a multiple of `top_k`.
    pub rerank_candidate_factor: usize,
    /// Enable query expansion (requires an expander collaborator).
    pub query_expansion: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: defaults::DEFAULT_TOP_K,
            source_timeout_ms: defaults::DEFAULT_SOURCE_TIMEOUT_MS,
            rerank_candidate_factor: defaults::DEFAULT_RERANK_CANDIDATE_FACTOR,
            query_expansion: defaults::DEFAULT_QUERY_EXPANSION,
        }
    }
}
