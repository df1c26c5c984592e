use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::FathomResult;
use crate::types::{RankedList, SourceName};

/// One source of a ranked list (dense vector search, sparse/BM25, graph walk).
///
/// Implementations must return results already ordered best-first, respect
/// `filters` as an exact-match predicate, and be safe to call concurrently
/// from multiple requests.
///
/// An `Err` means the call failed; an `Ok` with an empty list is a genuine
/// empty result. The two are never conflated.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Unique instance name, used for breaker keying and metadata.
    fn name(&self) -> &str;

    /// Which backend family this retriever belongs to.
    fn source(&self) -> SourceName;

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: &BTreeMap<String, String>,
    ) -> FathomResult<RankedList>;
}
