//! RerankerChain fallback behavior, breaker gating, and the score floor.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use fathom_core::config::{BreakerConfig, RerankConfig};
use fathom_core::traits::Reranker;
use fathom_core::types::{FusionResult, ScoredResult, SourceName};
use fathom_resilience::{BreakerRegistry, CircuitState};
use fathom_retrieval::RerankerChain;
use test_fixtures::{RerankBehavior, ScriptedReranker};

fn candidates(doc_ids: &[&str]) -> Vec<FusionResult> {
    doc_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| FusionResult {
            result: ScoredResult {
                doc_id: (*id).to_string(),
                snippet: format!("snippet {id}"),
                raw_score: 1.0,
                source_rank: idx + 1,
                source: SourceName::Dense,
                metadata: BTreeMap::new(),
            },
            fused_score: 1.0 / (61 + idx) as f64,
            sources: BTreeSet::from([SourceName::Dense]),
            source_ranks: BTreeMap::from([(SourceName::Dense, idx + 1)]),
        })
        .collect()
}

fn chain_with(
    strategies: Vec<Arc<ScriptedReranker>>,
    config: RerankConfig,
) -> (RerankerChain, Arc<BreakerRegistry>) {
    let registry = Arc::new(BreakerRegistry::new(BreakerConfig::default()));
    let dyn_strategies: Vec<Arc<dyn Reranker>> = strategies
        .into_iter()
        .map(|s| s as Arc<dyn Reranker>)
        .collect();
    let chain = RerankerChain::new(dyn_strategies, Arc::clone(&registry), config);
    (chain, registry)
}

#[tokio::test]
async fn first_success_stops_the_chain() {
    let first = Arc::new(ScriptedReranker::new("cross-encoder", RerankBehavior::Reverse));
    let second = Arc::new(ScriptedReranker::new("local", RerankBehavior::Reverse));
    let (chain, _) = chain_with(
        vec![Arc::clone(&first), Arc::clone(&second)],
        RerankConfig::default(),
    );

    let input = candidates(&["a", "b", "c"]);
    let (out, outcome) = chain.rerank("query", &input, 3).await;

    assert_eq!(outcome.strategy, "cross-encoder");
    assert!(!outcome.degraded);
    let order: Vec<&str> = out.iter().map(|r| r.doc_id()).collect();
    assert_eq!(order, vec!["c", "b", "a"]);
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 0, "later strategies never invoked");
}

#[tokio::test]
async fn falls_through_failures_to_third_strategy() {
    let first = Arc::new(ScriptedReranker::new("late-interaction", RerankBehavior::Fail));
    let second = Arc::new(ScriptedReranker::new("cross-encoder", RerankBehavior::Empty));
    let third = Arc::new(ScriptedReranker::new("local", RerankBehavior::Reverse));
    let (chain, registry) = chain_with(
        vec![Arc::clone(&first), Arc::clone(&second), Arc::clone(&third)],
        RerankConfig::default(),
    );

    let input = candidates(&["a", "b"]);
    let (out, outcome) = chain.rerank("query", &input, 2).await;

    assert_eq!(outcome.strategy, "local");
    assert_eq!(outcome.attempted, vec!["late-interaction", "cross-encoder", "local"]);
    assert_eq!(out[0].doc_id(), "b");

    // Each failed strategy recorded exactly one breaker failure.
    assert_eq!(registry.breaker("late-interaction").snapshot().failure_count, 1);
    assert_eq!(registry.breaker("cross-encoder").snapshot().failure_count, 1);
    assert_eq!(registry.breaker("local").snapshot().failure_count, 0);
}

#[tokio::test]
async fn total_failure_returns_input_unchanged() {
    let first = Arc::new(ScriptedReranker::new("a", RerankBehavior::Fail));
    let second = Arc::new(ScriptedReranker::new("b", RerankBehavior::Fail));
    let (chain, _) = chain_with(vec![first, second], RerankConfig::default());

    let input = candidates(&["x", "y", "z"]);
    let (out, outcome) = chain.rerank("query", &input, 3).await;

    assert_eq!(outcome.strategy, "none");
    assert!(outcome.degraded);
    let order: Vec<&str> = out.iter().map(|r| r.doc_id()).collect();
    assert_eq!(order, vec!["x", "y", "z"]);
}

#[tokio::test]
async fn open_breaker_skips_without_calling() {
    let gated = Arc::new(ScriptedReranker::new("flaky", RerankBehavior::Reverse));
    let backup = Arc::new(ScriptedReranker::new("backup", RerankBehavior::Reverse));
    let (chain, registry) = chain_with(
        vec![Arc::clone(&gated), Arc::clone(&backup)],
        RerankConfig::default(),
    );

    // Open the first strategy's breaker out of band.
    let breaker = registry.breaker("flaky");
    for _ in 0..BreakerConfig::default().failure_threshold {
        breaker.record_failure();
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    let input = candidates(&["a", "b"]);
    let (_, outcome) = chain.rerank("query", &input, 2).await;

    assert_eq!(gated.calls(), 0, "open breaker must prevent the call");
    assert_eq!(outcome.strategy, "backup");
    assert_eq!(outcome.attempted, vec!["backup"]);
}

#[tokio::test]
async fn timeout_counts_as_failure() {
    let slow = Arc::new(ScriptedReranker::new(
        "slow",
        RerankBehavior::Hang(Duration::from_millis(200)),
    ));
    let fast = Arc::new(ScriptedReranker::new("fast", RerankBehavior::Reverse));
    let config = RerankConfig {
        timeout_ms: 20,
        ..RerankConfig::default()
    };
    let (chain, registry) = chain_with(vec![slow, fast], config);

    let input = candidates(&["a", "b"]);
    let (_, outcome) = chain.rerank("query", &input, 2).await;

    assert_eq!(outcome.strategy, "fast");
    assert_eq!(registry.breaker("slow").snapshot().failure_count, 1);
}

#[tokio::test]
async fn invented_doc_ids_count_as_failure() {
    let inventor = Arc::new(ScriptedReranker::new("inventor", RerankBehavior::InventDocs));
    let honest = Arc::new(ScriptedReranker::new("honest", RerankBehavior::Reverse));
    let (chain, registry) = chain_with(vec![inventor, honest], RerankConfig::default());

    let input = candidates(&["a", "b"]);
    let (out, outcome) = chain.rerank("query", &input, 2).await;

    assert_eq!(outcome.strategy, "honest");
    assert_eq!(registry.breaker("inventor").snapshot().failure_count, 1);
    assert!(out.iter().all(|r| r.doc_id() == "a" || r.doc_id() == "b"));
}

#[tokio::test]
async fn score_floor_applies_only_after_success() {
    // Both candidates sit below the floor, so the strategy still sees them;
    // the floor then filters its output.
    let reranker = Arc::new(ScriptedReranker::new("cross-encoder", RerankBehavior::Reverse));
    let config = RerankConfig {
        min_score: 10.0,
        ..RerankConfig::default()
    };
    let (chain, _) = chain_with(vec![Arc::clone(&reranker)], config);

    let input = candidates(&["a", "b"]);
    let (out, outcome) = chain.rerank("query", &input, 2).await;

    assert_eq!(reranker.calls(), 1, "low scores must not block reranking");
    assert!(!outcome.degraded);
    assert!(out.is_empty(), "floor filters the successful output");
}
