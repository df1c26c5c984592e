use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{ScoredResult, SourceName};

/// One document after rank fusion.
///
/// `fused_score` is the only globally comparable score in the system. The
/// embedded `result` carries the snippet from the single strongest
/// contribution (numerically smallest rank).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionResult {
    pub result: ScoredResult,
    /// Globally comparable fused score (weighted RRF sum).
    pub fused_score: f64,
    /// Every source that contributed at least one ranked hit.
    pub sources: BTreeSet<SourceName>,
    /// Smallest contributing rank per source.
    pub source_ranks: BTreeMap<SourceName, usize>,
}

impl FusionResult {
    pub fn doc_id(&self) -> &str {
        &self.result.doc_id
    }

    /// Smallest rank this document achieved in any contributing source.
    /// Used as the first tie-breaker after `fused_score`.
    pub fn min_rank(&self) -> usize {
        self.source_ranks
            .values()
            .copied()
            .min()
            .unwrap_or(usize::MAX)
    }
}
