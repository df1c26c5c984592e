use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_TOP_K;
use crate::errors::{FathomResult, RetrievalError};
use crate::types::SourceName;

/// One search request. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    raw: String,
    normalized: String,
    source_weights: BTreeMap<SourceName, f64>,
    filters: BTreeMap<String, String>,
    top_k: usize,
    rerank: bool,
}

impl SearchQuery {
    /// Build a query, normalizing the text and validating parameters.
    ///
    /// Returns `InvalidQuery` for empty text (after normalization) or
    /// `top_k == 0`. `top_k` is capped at [`MAX_TOP_K`].
    pub fn new(raw: impl Into<String>, top_k: usize) -> FathomResult<Self> {
        let raw = raw.into();
        let normalized = normalize(&raw);

        if normalized.is_empty() {
            return Err(RetrievalError::InvalidQuery {
                reason: "empty query text".to_string(),
            }
            .into());
        }
        if top_k == 0 {
            return Err(RetrievalError::InvalidQuery {
                reason: "top_k must be >= 1".to_string(),
            }
            .into());
        }

        Ok(Self {
            raw,
            normalized,
            source_weights: BTreeMap::new(),
            filters: BTreeMap::new(),
            top_k: top_k.min(MAX_TOP_K),
            rerank: true,
        })
    }

    /// Set per-source weights. Sources without an entry default to 1.0.
    pub fn with_source_weights(mut self, weights: BTreeMap<SourceName, f64>) -> Self {
        self.source_weights = weights;
        self
    }

    /// Set exact-match filter predicates passed through to every source.
    pub fn with_filters(mut self, filters: BTreeMap<String, String>) -> Self {
        self.filters = filters;
        self
    }

    /// Enable or disable reranking for this request.
    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Weight for a source, defaulting to 1.0 when unset.
    pub fn source_weight(&self, source: SourceName) -> f64 {
        self.source_weights.get(&source).copied().unwrap_or(1.0)
    }

    pub fn source_weights(&self) -> &BTreeMap<SourceName, f64> {
        &self.source_weights
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn rerank(&self) -> bool {
        self.rerank
    }
}

/// Lowercase and collapse all whitespace runs to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
