use async_trait::async_trait;

use crate::errors::FathomResult;
use crate::types::FusionResult;

/// One reranking strategy (cross-encoder, late-interaction, LLM-judged, local).
///
/// Must return a subset or reordering of `candidates`, never invent new
/// doc_ids. The chain drops any invented ids defensively and counts the call
/// as a failure.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Strategy name, reported in `SearchMetadata::reranker_used`.
    fn name(&self) -> &str;

    async fn rerank(
        &self,
        query: &str,
        candidates: &[FusionResult],
        top_k: usize,
    ) -> FathomResult<Vec<FusionResult>>;
}
