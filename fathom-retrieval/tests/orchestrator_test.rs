//! End-to-end orchestrator behavior: fan-out, degradation, caching.

use std::sync::Arc;
use std::time::Duration;

use fathom_cache::CacheStore;
use fathom_core::config::FathomConfig;
use fathom_core::errors::{FathomError, RetrievalError};
use fathom_core::traits::{Reranker, Retriever};
use fathom_core::types::{CacheOutcome, SearchQuery, SourceName};
use fathom_resilience::BreakerRegistry;
use fathom_retrieval::{RerankerChain, RetrievalOrchestrator};
use test_fixtures::{
    FailingEmbedder, FailingExpander, FailingRetriever, RerankBehavior, ScriptedReranker,
    StaticEmbedder, StaticExpander, StaticRetriever,
};

fn config() -> FathomConfig {
    let mut cfg = FathomConfig::default();
    cfg.retrieval.source_timeout_ms = 200;
    cfg
}

fn orchestrator(
    retrievers: Vec<Arc<dyn Retriever>>,
    rerankers: Vec<Arc<dyn Reranker>>,
    cfg: FathomConfig,
) -> RetrievalOrchestrator {
    let registry = Arc::new(BreakerRegistry::new(cfg.breaker.clone()));
    let chain = RerankerChain::new(rerankers, Arc::clone(&registry), cfg.rerank.clone());
    let cache = Arc::new(CacheStore::new(cfg.cache.clone()));
    RetrievalOrchestrator::new(retrievers, chain, cache, registry, cfg)
}

fn dense(docs: &[(&str, f64)]) -> Arc<StaticRetriever> {
    Arc::new(StaticRetriever::new("dense-primary", SourceName::Dense, docs))
}

fn sparse(docs: &[(&str, f64)]) -> Arc<StaticRetriever> {
    Arc::new(StaticRetriever::new("sparse-bm25", SourceName::Sparse, docs))
}

#[tokio::test]
async fn hybrid_search_fuses_both_sources() {
    // Matches the canonical RRF example: doc2 > doc1 > doc3.
    let orch = orchestrator(
        vec![
            dense(&[("doc1", 0.9), ("doc2", 0.8), ("doc3", 0.7)]),
            sparse(&[("doc2", 12.0), ("doc1", 11.0)]),
        ],
        vec![],
        config(),
    );

    let query = SearchQuery::new("what is rrf", 3).unwrap();
    let (results, meta) = orch.search(query).await.unwrap();

    let order: Vec<&str> = results.iter().map(|r| r.doc_id()).collect();
    assert_eq!(order, vec!["doc2", "doc1", "doc3"]);
    assert_eq!(
        meta.sources_succeeded,
        vec![SourceName::Dense, SourceName::Sparse]
    );
    assert_eq!(meta.cache, CacheOutcome::Miss);
    assert!(!meta.degradation.any());
    assert_eq!(meta.reranker_used, "none");
}

#[tokio::test]
async fn partial_failure_degrades_silently() {
    let failing = Arc::new(FailingRetriever::new("graph-walk", SourceName::Graph));
    let orch = orchestrator(
        vec![
            dense(&[("doc1", 0.9), ("doc2", 0.8)]),
            sparse(&[("doc2", 12.0)]),
            Arc::clone(&failing) as Arc<dyn Retriever>,
        ],
        vec![],
        config(),
    );

    let query = SearchQuery::new("resilient query", 5).unwrap();
    let (results, meta) = orch.search(query).await.unwrap();

    assert!(!results.is_empty());
    assert!(meta.degradation.partial_sources);
    assert!(meta.sources_failed.contains_key("graph-walk"));
    assert_eq!(
        meta.sources_succeeded,
        vec![SourceName::Dense, SourceName::Sparse]
    );
    assert_eq!(failing.calls(), 1);
}

#[tokio::test]
async fn total_failure_is_a_hard_error() {
    let orch = orchestrator(
        vec![
            Arc::new(FailingRetriever::new("dense-a", SourceName::Dense)),
            Arc::new(FailingRetriever::new("sparse-b", SourceName::Sparse)),
        ],
        vec![],
        config(),
    );

    let query = SearchQuery::new("doomed query", 5).unwrap();
    let err = orch.search(query).await.unwrap_err();

    assert!(matches!(
        err,
        FathomError::Retrieval(RetrievalError::AllSourcesUnavailable { attempted: 2 })
    ));
}

#[tokio::test]
async fn slow_source_times_out_and_degrades() {
    let slow = Arc::new(
        StaticRetriever::new("dense-slow", SourceName::Dense, &[("late", 0.9)])
            .with_delay(Duration::from_millis(500)),
    );
    let orch = orchestrator(
        vec![slow, sparse(&[("doc1", 10.0)])],
        vec![],
        config(), // 200ms source timeout
    );

    let query = SearchQuery::new("timeout test", 5).unwrap();
    let (results, meta) = orch.search(query).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id(), "doc1");
    assert!(meta.degradation.partial_sources);
    assert!(meta.sources_failed["dense-slow"].contains("timed out"));
}

#[tokio::test]
async fn deadline_cancels_pending_sources() {
    let slow = Arc::new(
        StaticRetriever::new("dense-slow", SourceName::Dense, &[("late", 0.9)])
            .with_delay(Duration::from_millis(5_000)),
    );
    let mut cfg = config();
    cfg.retrieval.source_timeout_ms = 10_000; // deadline, not timeout, cuts it
    let orch = orchestrator(vec![slow, sparse(&[("doc1", 10.0)])], vec![], cfg);

    let query = SearchQuery::new("deadline test", 5).unwrap();
    let started = std::time::Instant::now();
    let (results, meta) = orch
        .search_with_deadline(query, Duration::from_millis(100))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(results[0].doc_id(), "doc1");
    assert!(meta.sources_failed.contains_key("dense-slow"));
}

#[tokio::test]
async fn second_identical_query_hits_the_exact_cache() {
    let retriever = dense(&[("doc1", 0.9)]);
    let orch = orchestrator(vec![Arc::clone(&retriever) as Arc<dyn Retriever>], vec![], config());

    let (first, meta) = orch
        .search(SearchQuery::new("cache me", 5).unwrap())
        .await
        .unwrap();
    assert_eq!(meta.cache, CacheOutcome::Miss);
    assert_eq!(retriever.calls(), 1);

    // The publish is asynchronous; give it a moment to land.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (second, meta) = orch
        .search(SearchQuery::new("cache me", 5).unwrap())
        .await
        .unwrap();
    assert_eq!(meta.cache, CacheOutcome::ExactHit);
    assert_eq!(retriever.calls(), 1, "cache hit makes no backend calls");
    assert_eq!(
        first.iter().map(|r| r.doc_id()).collect::<Vec<_>>(),
        second.iter().map(|r| r.doc_id()).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn near_duplicate_query_hits_the_similarity_cache() {
    let retriever = dense(&[("doc1", 0.9)]);
    let mut cfg = config();
    cfg.cache.similarity_enabled = true;
    let registry = Arc::new(BreakerRegistry::new(cfg.breaker.clone()));
    let chain = RerankerChain::new(vec![], Arc::clone(&registry), cfg.rerank.clone());
    let cache = Arc::new(CacheStore::new(cfg.cache.clone()));
    let orch = RetrievalOrchestrator::new(
        vec![Arc::clone(&retriever) as Arc<dyn Retriever>],
        chain,
        cache,
        registry,
        cfg,
    )
    .with_embedder(Arc::new(StaticEmbedder::new(vec![0.6, 0.8])));

    orch.search(SearchQuery::new("what is rust", 5).unwrap())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Different cache key, identical embedding: similarity ≥ threshold.
    let (_, meta) = orch
        .search(SearchQuery::new("what is rust exactly", 5).unwrap())
        .await
        .unwrap();
    assert_eq!(meta.cache, CacheOutcome::SimilarHit);
    assert_eq!(retriever.calls(), 1);
}

#[tokio::test]
async fn embedder_failure_flags_cache_degradation() {
    let mut cfg = config();
    cfg.cache.similarity_enabled = true;
    let registry = Arc::new(BreakerRegistry::new(cfg.breaker.clone()));
    let chain = RerankerChain::new(vec![], Arc::clone(&registry), cfg.rerank.clone());
    let cache = Arc::new(CacheStore::new(cfg.cache.clone()));
    let orch = RetrievalOrchestrator::new(
        vec![dense(&[("doc1", 0.9)]) as Arc<dyn Retriever>],
        chain,
        cache,
        registry,
        cfg,
    )
    .with_embedder(Arc::new(FailingEmbedder));

    let (results, meta) = orch
        .search(SearchQuery::new("still works", 5).unwrap())
        .await
        .unwrap();
    assert!(!results.is_empty());
    assert!(meta.degradation.cache_degraded);
}

#[tokio::test]
async fn expansion_fans_out_per_variant() {
    let retriever = dense(&[("doc1", 0.9)]);
    let mut cfg = config();
    cfg.retrieval.query_expansion = true;
    let registry = Arc::new(BreakerRegistry::new(cfg.breaker.clone()));
    let chain = RerankerChain::new(vec![], Arc::clone(&registry), cfg.rerank.clone());
    let cache = Arc::new(CacheStore::new(cfg.cache.clone()));
    let orch = RetrievalOrchestrator::new(
        vec![Arc::clone(&retriever) as Arc<dyn Retriever>],
        chain,
        cache,
        registry,
        cfg,
    )
    .with_expander(Arc::new(StaticExpander::new(&[("rust language", 0.5)])));

    orch.search(SearchQuery::new("rust", 5).unwrap())
        .await
        .unwrap();
    assert_eq!(retriever.calls(), 2, "original plus one expanded variant");
}

#[tokio::test]
async fn expander_failure_degrades_to_single_query() {
    let retriever = dense(&[("doc1", 0.9)]);
    let mut cfg = config();
    cfg.retrieval.query_expansion = true;
    let registry = Arc::new(BreakerRegistry::new(cfg.breaker.clone()));
    let chain = RerankerChain::new(vec![], Arc::clone(&registry), cfg.rerank.clone());
    let cache = Arc::new(CacheStore::new(cfg.cache.clone()));
    let orch = RetrievalOrchestrator::new(
        vec![Arc::clone(&retriever) as Arc<dyn Retriever>],
        chain,
        cache,
        registry,
        cfg,
    )
    .with_expander(Arc::new(FailingExpander));

    let (results, meta) = orch
        .search(SearchQuery::new("rust", 5).unwrap())
        .await
        .unwrap();
    assert!(!results.is_empty());
    assert!(meta.degradation.expansion_degraded);
    assert_eq!(retriever.calls(), 1);
}

#[tokio::test]
async fn reranker_fallback_is_reported_in_metadata() {
    let orch = orchestrator(
        vec![dense(&[("doc1", 0.9), ("doc2", 0.8)])],
        vec![
            Arc::new(ScriptedReranker::new("late-interaction", RerankBehavior::Fail)),
            Arc::new(ScriptedReranker::new("cross-encoder", RerankBehavior::Fail)),
            Arc::new(ScriptedReranker::new("local", RerankBehavior::Reverse)),
        ],
        config(),
    );

    let (results, meta) = orch
        .search(SearchQuery::new("rerank me", 2).unwrap())
        .await
        .unwrap();

    assert_eq!(meta.reranker_used, "local");
    assert!(!meta.degradation.rerank_degraded);
    assert_eq!(results[0].doc_id(), "doc2", "reranker's order wins");
}

#[tokio::test]
async fn all_rerankers_failing_returns_fused_order() {
    let orch = orchestrator(
        vec![dense(&[("doc1", 0.9), ("doc2", 0.8)])],
        vec![
            Arc::new(ScriptedReranker::new("a", RerankBehavior::Fail)),
            Arc::new(ScriptedReranker::new("b", RerankBehavior::Empty)),
        ],
        config(),
    );

    let (results, meta) = orch
        .search(SearchQuery::new("degraded rerank", 2).unwrap())
        .await
        .unwrap();

    assert_eq!(meta.reranker_used, "none");
    assert!(meta.degradation.rerank_degraded);
    assert_eq!(results[0].doc_id(), "doc1", "fused order preserved");
}

#[tokio::test]
async fn rerank_disabled_on_query_skips_the_chain() {
    let reranker = Arc::new(ScriptedReranker::new("cross-encoder", RerankBehavior::Reverse));
    let orch = orchestrator(
        vec![dense(&[("doc1", 0.9), ("doc2", 0.8)])],
        vec![Arc::clone(&reranker) as Arc<dyn Reranker>],
        config(),
    );

    let query = SearchQuery::new("no rerank", 2).unwrap().with_rerank(false);
    let (results, meta) = orch.search(query).await.unwrap();

    assert_eq!(reranker.calls(), 0);
    assert_eq!(meta.reranker_used, "none");
    assert_eq!(results[0].doc_id(), "doc1");
}

#[tokio::test]
async fn results_truncate_to_top_k() {
    let orch = orchestrator(
        vec![dense(&[
            ("doc1", 0.9),
            ("doc2", 0.8),
            ("doc3", 0.7),
            ("doc4", 0.6),
        ])],
        vec![],
        config(),
    );

    let (results, _) = orch
        .search(SearchQuery::new("truncate", 2).unwrap())
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn repeated_source_failures_open_the_breaker() {
    let failing = Arc::new(FailingRetriever::new("graph-walk", SourceName::Graph));
    let cfg = config();
    let threshold = cfg.breaker.failure_threshold as usize;
    let orch = orchestrator(
        vec![
            dense(&[("doc1", 0.9)]),
            Arc::clone(&failing) as Arc<dyn Retriever>,
        ],
        vec![],
        cfg,
    );

    for i in 0..threshold + 3 {
        // Distinct queries bypass the result cache.
        let query = SearchQuery::new(format!("query number {i}"), 3).unwrap();
        orch.search(query).await.unwrap();
    }

    // Once the breaker opened, further requests stopped reaching the source.
    assert_eq!(failing.calls(), threshold);
    let snapshots = orch.breaker_snapshots();
    assert_eq!(
        snapshots["graph-walk"].state,
        fathom_resilience::CircuitState::Open
    );
}
