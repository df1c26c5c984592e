//! Mock port implementations shared by integration tests across crates.
//!
//! Every mock counts its invocations so tests can assert that breakers and
//! deadlines actually prevented calls.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use fathom_core::errors::{FathomResult, RetrievalError};
use fathom_core::traits::{Embedder, QueryExpander, Reranker, Retriever};
use fathom_core::types::{FusionResult, RankedList, ScoredResult, SourceName};

/// Build a ranked list for `source` from `(doc_id, raw_score)` pairs, best
/// first.
pub fn ranked_list(source: SourceName, docs: &[(&str, f64)]) -> RankedList {
    RankedList::new(
        docs.iter()
            .enumerate()
            .map(|(idx, (doc_id, raw_score))| ScoredResult {
                doc_id: (*doc_id).to_string(),
                snippet: format!("{source} snippet for {doc_id}"),
                raw_score: *raw_score,
                source_rank: idx + 1,
                source,
                metadata: BTreeMap::new(),
            })
            .collect(),
    )
}

/// Retriever that always returns the same list.
pub struct StaticRetriever {
    name: String,
    source: SourceName,
    docs: Vec<(String, f64)>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticRetriever {
    pub fn new(name: &str, source: SourceName, docs: &[(&str, f64)]) -> Self {
        Self {
            name: name.to_string(),
            source,
            docs: docs
                .iter()
                .map(|(id, score)| ((*id).to_string(), *score))
                .collect(),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Delay every response, for timeout and deadline tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SourceName {
        self.source
    }

    async fn search(
        &self,
        _query: &str,
        top_k: usize,
        _filters: &BTreeMap<String, String>,
    ) -> FathomResult<RankedList> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let pairs: Vec<(&str, f64)> = self
            .docs
            .iter()
            .take(top_k)
            .map(|(id, score)| (id.as_str(), *score))
            .collect();
        Ok(ranked_list(self.source, &pairs))
    }
}

/// Retriever that always fails.
pub struct FailingRetriever {
    name: String,
    source: SourceName,
    calls: AtomicUsize,
}

impl FailingRetriever {
    pub fn new(name: &str, source: SourceName) -> Self {
        Self {
            name: name.to_string(),
            source,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for FailingRetriever {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SourceName {
        self.source
    }

    async fn search(
        &self,
        _query: &str,
        _top_k: usize,
        _filters: &BTreeMap<String, String>,
    ) -> FathomResult<RankedList> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RetrievalError::SourceFailed {
            source: self.name.clone(),
            reason: "backend unreachable".to_string(),
        }
        .into())
    }
}

/// What a [`ScriptedReranker`] does when invoked.
pub enum RerankBehavior {
    /// Return the candidates reversed (visible reordering).
    Reverse,
    /// Return an error.
    Fail,
    /// Return an empty list.
    Empty,
    /// Sleep for the given duration, then return the input unchanged.
    Hang(Duration),
    /// Return results whose doc_ids exist nowhere in the candidates.
    InventDocs,
}

/// Reranker with a scripted behavior and a call counter.
pub struct ScriptedReranker {
    name: String,
    behavior: RerankBehavior,
    calls: AtomicUsize,
}

impl ScriptedReranker {
    pub fn new(name: &str, behavior: RerankBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reranker for ScriptedReranker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rerank(
        &self,
        _query: &str,
        candidates: &[FusionResult],
        _top_k: usize,
    ) -> FathomResult<Vec<FusionResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            RerankBehavior::Reverse => {
                let mut reversed: Vec<FusionResult> = candidates.to_vec();
                reversed.reverse();
                Ok(reversed)
            }
            RerankBehavior::Fail => Err(RetrievalError::RerankFailed {
                strategy: self.name.clone(),
                reason: "model unavailable".to_string(),
            }
            .into()),
            RerankBehavior::Empty => Ok(Vec::new()),
            RerankBehavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(candidates.to_vec())
            }
            RerankBehavior::InventDocs => {
                let mut invented = candidates.to_vec();
                for (idx, result) in invented.iter_mut().enumerate() {
                    result.result.doc_id = format!("invented-{idx}");
                }
                Ok(invented)
            }
        }
    }
}

/// Embedder returning a fixed vector.
pub struct StaticEmbedder {
    vector: Vec<f32>,
}

impl StaticEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, _text: &str) -> FathomResult<Vec<f32>> {
        Ok(self.vector.clone())
    }
}

/// Embedder that always fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> FathomResult<Vec<f32>> {
        Err(RetrievalError::EmbeddingFailed {
            reason: "embedding service down".to_string(),
        }
        .into())
    }
}

/// Expander returning fixed weighted variants.
pub struct StaticExpander {
    variants: Vec<(String, f64)>,
}

impl StaticExpander {
    pub fn new(variants: &[(&str, f64)]) -> Self {
        Self {
            variants: variants
                .iter()
                .map(|(text, weight)| ((*text).to_string(), *weight))
                .collect(),
        }
    }
}

#[async_trait]
impl QueryExpander for StaticExpander {
    async fn expand(&self, _query: &str) -> FathomResult<Vec<(String, f64)>> {
        Ok(self.variants.clone())
    }
}

/// Expander that always fails.
pub struct FailingExpander;

#[async_trait]
impl QueryExpander for FailingExpander {
    async fn expand(&self, _query: &str) -> FathomResult<Vec<(String, f64)>> {
        Err(RetrievalError::ExpansionFailed {
            reason: "expansion model down".to_string(),
        }
        .into())
    }
}
