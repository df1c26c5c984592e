use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::SourceName;

/// How a request interacted with the result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    Miss,
    ExactHit,
    SimilarHit,
}

/// Non-fatal degradations observed while serving a request.
///
/// Failures that can be recovered locally never surface as errors; they are
/// reported here so callers can decide whether to warn, log, or retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradationFlags {
    /// One or more (but not all) sources failed or timed out.
    pub partial_sources: bool,
    /// Every reranker strategy failed; unreranked fused order was returned.
    pub rerank_degraded: bool,
    /// Query expansion failed; the request ran in single-query mode.
    pub expansion_degraded: bool,
    /// Embedding or cache access failed; the request skipped the cache.
    pub cache_degraded: bool,
}

impl DegradationFlags {
    pub fn any(&self) -> bool {
        self.partial_sources
            || self.rerank_degraded
            || self.expansion_degraded
            || self.cache_degraded
    }
}

/// Per-request report returned alongside the result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub request_id: Uuid,
    /// Sources that returned a usable ranked list.
    pub sources_succeeded: Vec<SourceName>,
    /// Failed sources with the failure reason, keyed by source name.
    pub sources_failed: BTreeMap<String, String>,
    pub cache: CacheOutcome,
    /// Name of the reranker strategy that produced the final order,
    /// or "none" when reranking was skipped or fully degraded.
    pub reranker_used: String,
    pub degradation: DegradationFlags,
    pub elapsed_ms: u64,
}

impl SearchMetadata {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            sources_succeeded: Vec::new(),
            sources_failed: BTreeMap::new(),
            cache: CacheOutcome::Miss,
            reranker_used: "none".to_string(),
            degradation: DegradationFlags::default(),
            elapsed_ms: 0,
        }
    }
}

impl Default for SearchMetadata {
    fn default() -> Self {
        Self::new()
    }
}
