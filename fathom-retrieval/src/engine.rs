//! RetrievalOrchestrator: cache probe → concurrent fan-out → fusion →
//! rerank → cache publish.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

use fathom_cache::CacheStore;
use fathom_core::config::FathomConfig;
use fathom_core::constants::{MAX_EXPANSION_VARIANTS, MAX_RERANK_CANDIDATES};
use fathom_core::errors::{FathomResult, RetrievalError};
use fathom_core::traits::{Embedder, QueryExpander, Retriever};
use fathom_core::types::{
    CacheKey, CacheOutcome, FusionResult, RankedList, SearchMetadata, SearchQuery,
};
use fathom_resilience::BreakerRegistry;

use crate::fusion::{FusionEngine, QueryVariant};
use crate::rerank::RerankerChain;

/// Outcome of one retriever call for one query variant.
struct FanoutResult {
    variant_idx: usize,
    retriever_idx: usize,
    outcome: Result<RankedList, String>,
}

/// The coordinator for one retrieval deployment.
///
/// Holds every dependency explicitly; built once at process start and shared
/// across concurrent requests. No global state.
pub struct RetrievalOrchestrator {
    retrievers: Vec<Arc<dyn Retriever>>,
    chain: RerankerChain,
    cache: Arc<CacheStore>,
    embedder: Option<Arc<dyn Embedder>>,
    expander: Option<Arc<dyn QueryExpander>>,
    registry: Arc<BreakerRegistry>,
    fusion: FusionEngine,
    config: FathomConfig,
}

impl RetrievalOrchestrator {
    pub fn new(
        retrievers: Vec<Arc<dyn Retriever>>,
        chain: RerankerChain,
        cache: Arc<CacheStore>,
        registry: Arc<BreakerRegistry>,
        config: FathomConfig,
    ) -> Self {
        Self {
            retrievers,
            chain,
            cache,
            embedder: None,
            expander: None,
            registry,
            fusion: FusionEngine::new(config.fusion.clone()),
            config,
        }
    }

    /// Attach an embedder, enabling the similarity cache probe when the
    /// cache config turns it on.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Attach a query expander, used when `retrieval.query_expansion` is set.
    pub fn with_expander(mut self, expander: Arc<dyn QueryExpander>) -> Self {
        self.expander = Some(expander);
        self
    }

    /// Serve one search request.
    ///
    /// Errors only for an invalid query (checked at construction of
    /// [`SearchQuery`]) or when every configured source fails. All other
    /// failures degrade and are reported in the returned metadata.
    pub async fn search(
        &self,
        query: SearchQuery,
    ) -> FathomResult<(Vec<FusionResult>, SearchMetadata)> {
        let span = fathom_core::search_span!(query.normalized(), query.top_k());
        self.search_inner(query, None).instrument(span).await
    }

    /// Serve one search request under a caller-supplied deadline.
    ///
    /// If the deadline expires while sources are still pending, in-flight
    /// calls are cancelled and the request proceeds with whatever completed.
    pub async fn search_with_deadline(
        &self,
        query: SearchQuery,
        deadline: Duration,
    ) -> FathomResult<(Vec<FusionResult>, SearchMetadata)> {
        let span = fathom_core::search_span!(query.normalized(), query.top_k());
        self.search_inner(query, Some(Instant::now() + deadline))
            .instrument(span)
            .await
    }

    async fn search_inner(
        &self,
        query: SearchQuery,
        deadline: Option<Instant>,
    ) -> FathomResult<(Vec<FusionResult>, SearchMetadata)> {
        let started = std::time::Instant::now();
        let mut metadata = SearchMetadata::new();
        let key = CacheKey::for_query(&query);

        // Step 1: exact-key probe. A hit answers without any backend call.
        if let Some(cached) = self.cache.get_exact(&key) {
            debug!("exact cache hit");
            metadata.cache = CacheOutcome::ExactHit;
            metadata.elapsed_ms = started.elapsed().as_millis() as u64;
            return Ok((cached.to_vec(), metadata));
        }

        // Step 2: similarity probe, only with an embedder configured.
        let query_embedding = self.probe_embedding(&query, &mut metadata).await;
        if let Some(embedding) = &query_embedding {
            if let Some(cached) = self
                .cache
                .get_similar(embedding, self.config.cache.similarity_threshold)
            {
                metadata.cache = CacheOutcome::SimilarHit;
                metadata.elapsed_ms = started.elapsed().as_millis() as u64;
                return Ok((cached.to_vec(), metadata));
            }
        }

        // Step 3/4: optional expansion, then concurrent fan-out per variant.
        let variant_texts = self.expand(&query, &mut metadata).await;
        let variants = self
            .fan_out(&query, &variant_texts, deadline, &mut metadata)
            .await?;

        let fused = self.fusion.fuse(&variants);
        info!(
            candidates = fused.len(),
            sources = metadata.sources_succeeded.len(),
            "fusion complete"
        );

        // Step 5: rerank the top candidates through the fallback chain.
        let candidate_cap = (query.top_k() * self.config.retrieval.rerank_candidate_factor)
            .min(MAX_RERANK_CANDIDATES);
        let mut results: Vec<FusionResult> = fused.into_iter().take(candidate_cap).collect();

        if query.rerank() && !self.chain.is_empty() && !results.is_empty() {
            let (reranked, outcome) = self
                .chain
                .rerank(query.normalized(), &results, query.top_k())
                .await;
            metadata.reranker_used = outcome.strategy;
            metadata.degradation.rerank_degraded = outcome.degraded;
            results = reranked;
        }

        // Step 6: truncate, publish in the background, return.
        results.truncate(query.top_k());
        self.publish(key, &results, query_embedding);

        metadata.elapsed_ms = started.elapsed().as_millis() as u64;
        Ok((results, metadata))
    }

    /// Compute the query embedding for the similarity cache. Failure flags
    /// cache degradation but never fails the request.
    async fn probe_embedding(
        &self,
        query: &SearchQuery,
        metadata: &mut SearchMetadata,
    ) -> Option<Vec<f32>> {
        if !self.config.cache.similarity_enabled {
            return None;
        }
        let embedder = self.embedder.as_ref()?;

        match embedder.embed(query.normalized()).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!(error = %e, "query embedding failed, skipping similarity cache");
                metadata.degradation.cache_degraded = true;
                None
            }
        }
    }

    /// Expand the query into weighted variants. The original query always
    /// comes first with weight 1.0; expander failure degrades to
    /// single-query mode.
    async fn expand(&self, query: &SearchQuery, metadata: &mut SearchMetadata) -> Vec<(String, f64)> {
        let mut variants = vec![(query.normalized().to_string(), 1.0)];

        if !self.config.retrieval.query_expansion {
            return variants;
        }
        let Some(expander) = &self.expander else {
            return variants;
        };

        match expander.expand(query.normalized()).await {
            Ok(expanded) => {
                for (text, weight) in expanded.into_iter().take(MAX_EXPANSION_VARIANTS) {
                    if text != query.normalized() {
                        variants.push((text, weight));
                    }
                }
                debug!(variants = variants.len(), "query expanded");
            }
            Err(e) => {
                warn!(error = %e, "query expansion failed, single-query mode");
                metadata.degradation.expansion_degraded = true;
            }
        }
        variants
    }

    /// Fan out every variant to every retriever concurrently, each call
    /// bounded by the per-source timeout and gated by that source's breaker.
    ///
    /// Partial failure degrades silently into metadata; only the loss of
    /// every source is an error.
    async fn fan_out(
        &self,
        query: &SearchQuery,
        variant_texts: &[(String, f64)],
        deadline: Option<Instant>,
        metadata: &mut SearchMetadata,
    ) -> FathomResult<Vec<QueryVariant>> {
        let fetch_k = query.top_k() * self.config.retrieval.rerank_candidate_factor;
        let timeout = Duration::from_millis(self.config.retrieval.source_timeout_ms);

        let mut join_set: JoinSet<FanoutResult> = JoinSet::new();
        for (variant_idx, (text, _)) in variant_texts.iter().enumerate() {
            for (retriever_idx, retriever) in self.retrievers.iter().enumerate() {
                let breaker = self.registry.breaker(retriever.name());
                if let Err(e) = breaker.try_acquire() {
                    metadata
                        .sources_failed
                        .insert(retriever.name().to_string(), e.to_string());
                    continue;
                }

                let retriever = Arc::clone(retriever);
                let text = text.clone();
                let filters = query.filters().clone();
                join_set.spawn(async move {
                    let outcome =
                        match tokio::time::timeout(timeout, retriever.search(&text, fetch_k, &filters))
                            .await
                        {
                            Ok(Ok(list)) => {
                                breaker.record_success();
                                Ok(list)
                            }
                            Ok(Err(e)) => {
                                breaker.record_failure();
                                Err(e.to_string())
                            }
                            Err(_) => {
                                breaker.record_failure();
                                Err(format!("timed out after {}ms", timeout.as_millis()))
                            }
                        };
                    FanoutResult {
                        variant_idx,
                        retriever_idx,
                        outcome,
                    }
                });
            }
        }

        let mut variants: Vec<QueryVariant> = variant_texts
            .iter()
            .map(|(_, weight)| QueryVariant::new(*weight))
            .collect();
        let mut succeeded: Vec<bool> = vec![false; self.retrievers.len()];

        // Join with a bounded wait: each source finishes or times out on its
        // own; a caller deadline cancels whatever is still pending.
        loop {
            let joined = match deadline {
                None => join_set.join_next().await,
                Some(d) => match tokio::time::timeout_at(d, join_set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!("deadline expired, cancelling pending source calls");
                        join_set.abort_all();
                        break;
                    }
                },
            };
            let Some(joined) = joined else { break };
            // A panicked source task counts as a failed source.
            let Ok(result) = joined else { continue };

            let retriever = &self.retrievers[result.retriever_idx];
            match result.outcome {
                Ok(list) => {
                    succeeded[result.retriever_idx] = true;
                    let weight = query.source_weight(retriever.source());
                    variants[result.variant_idx].push(weight, list);
                }
                Err(reason) => {
                    warn!(source = retriever.name(), reason = %reason, "source failed");
                    metadata
                        .sources_failed
                        .insert(retriever.name().to_string(), reason);
                }
            }
        }

        for (idx, retriever) in self.retrievers.iter().enumerate() {
            if !succeeded[idx] {
                metadata
                    .sources_failed
                    .entry(retriever.name().to_string())
                    .or_insert_with(|| "cancelled before completion".to_string());
            }
        }

        let contributing: BTreeSet<_> = self
            .retrievers
            .iter()
            .enumerate()
            .filter(|(idx, _)| succeeded[*idx])
            .map(|(_, r)| r.source())
            .collect();
        metadata.sources_succeeded = contributing.into_iter().collect();

        if metadata.sources_succeeded.is_empty() {
            return Err(RetrievalError::AllSourcesUnavailable {
                attempted: self.retrievers.len(),
            }
            .into());
        }
        if !metadata.sources_failed.is_empty() {
            metadata.degradation.partial_sources = true;
        }

        Ok(variants)
    }

    /// Publish into the cache off the request path. Failure to cache is
    /// logged, never surfaced to the caller.
    fn publish(&self, key: CacheKey, results: &[FusionResult], embedding: Option<Vec<f32>>) {
        if results.is_empty() {
            return;
        }
        let cache = Arc::clone(&self.cache);
        let value = results.to_vec();
        tokio::spawn(async move {
            cache.put(key, &value, embedding);
            debug!("published result to cache");
        });
    }

    /// Breaker health per dependency, for diagnostics endpoints.
    pub fn breaker_snapshots(
        &self,
    ) -> BTreeMap<String, fathom_resilience::BreakerSnapshot> {
        self.registry.snapshots()
    }
}
