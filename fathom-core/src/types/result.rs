use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A retrieval backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceName {
    /// Dense vector similarity search.
    Dense,
    /// Sparse lexical search (BM25 or similar).
    Sparse,
    /// Graph traversal.
    Graph,
}

impl std::fmt::Display for SourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceName::Dense => write!(f, "dense"),
            SourceName::Sparse => write!(f, "sparse"),
            SourceName::Graph => write!(f, "graph"),
        }
    }
}

/// One hit from one source.
///
/// Identity is `doc_id` only. `raw_score` is on the source's own scale and
/// must never be compared across sources; only rank order carries meaning
/// between backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Opaque document identifier, stable across sources.
    pub doc_id: String,
    /// Owned content snippet, never a live reference into a source store.
    pub snippet: String,
    /// Source-scale score, informational only.
    pub raw_score: f64,
    /// 1-based position in the source's list.
    pub source_rank: usize,
    /// Which backend produced this hit.
    pub source: SourceName,
    /// Source-specific metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Ordered output of one retriever call. Index 0 is best.
///
/// The ordering is the contract, not `raw_score` magnitude. A list from a
/// single source is never reordered outside the fusion engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedList(pub Vec<ScoredResult>);

impl RankedList {
    pub fn new(results: Vec<ScoredResult>) -> Self {
        Self(results)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredResult> {
        self.0.iter()
    }
}

impl IntoIterator for RankedList {
    type Item = ScoredResult;
    type IntoIter = std::vec::IntoIter<ScoredResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
