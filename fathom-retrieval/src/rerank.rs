//! Ordered fallback sequence of reranking strategies, each gated by its own
//! circuit breaker.
//!
//! A strategy whose breaker is open is skipped without any I/O. A timeout,
//! error, empty result, or invented doc_id counts as a breaker failure and
//! the chain advances. Total failure is never an error: the input order is
//! returned with a degradation marker.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use fathom_core::config::RerankConfig;
use fathom_core::traits::Reranker;
use fathom_core::types::FusionResult;
use fathom_resilience::BreakerRegistry;

/// What the chain did for one request.
#[derive(Debug, Clone)]
pub struct RerankOutcome {
    /// Strategy that produced the final order, or "none".
    pub strategy: String,
    /// True when every strategy was skipped or failed.
    pub degraded: bool,
    /// Strategies actually invoked, in attempt order.
    pub attempted: Vec<String>,
}

impl RerankOutcome {
    fn degraded(attempted: Vec<String>) -> Self {
        Self {
            strategy: "none".to_string(),
            degraded: true,
            attempted,
        }
    }
}

/// Priority-ordered reranker chain (e.g. late-interaction → cross-encoder →
/// LLM-judged → local model).
pub struct RerankerChain {
    strategies: Vec<Arc<dyn Reranker>>,
    registry: Arc<BreakerRegistry>,
    config: RerankConfig,
}

impl RerankerChain {
    pub fn new(
        strategies: Vec<Arc<dyn Reranker>>,
        registry: Arc<BreakerRegistry>,
        config: RerankConfig,
    ) -> Self {
        Self {
            strategies,
            registry,
            config,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Rerank `candidates`, falling back through the chain on failure.
    ///
    /// The minimum-score floor applies only to a successful rerank's output;
    /// low-confidence originals are never withheld from the strategies.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: &[FusionResult],
        top_k: usize,
    ) -> (Vec<FusionResult>, RerankOutcome) {
        let known_ids: HashSet<&str> = candidates.iter().map(|c| c.doc_id()).collect();
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut attempted = Vec::new();

        for reranker in &self.strategies {
            let name = reranker.name().to_string();
            let breaker = self.registry.breaker(&name);

            if breaker.try_acquire().is_err() {
                debug!(strategy = %name, "breaker open, skipping reranker");
                continue;
            }
            attempted.push(name.clone());

            let call = reranker.rerank(query, candidates, top_k);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(rescored)) if !rescored.is_empty() => {
                    // A strategy must never invent documents; drop any
                    // unknown ids and treat a fully-invented result as a
                    // failure.
                    let valid: Vec<FusionResult> = rescored
                        .into_iter()
                        .filter(|r| known_ids.contains(r.doc_id()))
                        .collect();
                    if valid.is_empty() {
                        warn!(strategy = %name, "reranker returned only unknown doc_ids");
                        breaker.record_failure();
                        continue;
                    }

                    breaker.record_success();
                    let kept: Vec<FusionResult> = valid
                        .into_iter()
                        .filter(|r| r.fused_score >= self.config.min_score)
                        .take(top_k)
                        .collect();
                    debug!(strategy = %name, kept = kept.len(), "rerank succeeded");
                    return (
                        kept,
                        RerankOutcome {
                            strategy: name,
                            degraded: false,
                            attempted,
                        },
                    );
                }
                Ok(Ok(_)) => {
                    warn!(strategy = %name, "reranker returned empty result");
                    breaker.record_failure();
                }
                Ok(Err(e)) => {
                    warn!(strategy = %name, error = %e, "reranker failed");
                    breaker.record_failure();
                }
                Err(_) => {
                    warn!(strategy = %name, timeout_ms = self.config.timeout_ms, "reranker timed out");
                    breaker.record_failure();
                }
            }
        }

        (candidates.to_vec(), RerankOutcome::degraded(attempted))
    }
}
