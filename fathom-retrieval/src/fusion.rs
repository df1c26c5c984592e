//! Weighted Reciprocal Rank Fusion: score = Σ qw · sw · 1/(k + rank)
//!
//! Merges ranked lists from incomparable score scales into one globally
//! meaningful ordering using rank positions only. Pure and side-effect free:
//! identical inputs produce identical output regardless of input iteration
//! order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use fathom_core::config::FusionConfig;
use fathom_core::types::{FusionResult, RankedList, ScoredResult, SourceName};

/// One ranked list with the weight of the source that produced it.
#[derive(Debug, Clone)]
pub struct WeightedList {
    pub source_weight: f64,
    pub list: RankedList,
}

/// All per-source lists retrieved for one query phrasing, with the weight of
/// that phrasing (1.0 for the original query, expander-assigned otherwise).
#[derive(Debug, Clone, Default)]
pub struct QueryVariant {
    pub weight: f64,
    pub lists: Vec<WeightedList>,
}

impl QueryVariant {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            lists: Vec::new(),
        }
    }

    pub fn push(&mut self, source_weight: f64, list: RankedList) {
        self.lists.push(WeightedList {
            source_weight,
            list,
        });
    }
}

/// One RRF contribution, kept until finalization so the per-document sum can
/// run in a deterministic order.
struct Contribution {
    rank: usize,
    source: SourceName,
    value: f64,
}

struct DocAccumulator {
    best: ScoredResult,
    contributions: Vec<Contribution>,
    sources: BTreeSet<SourceName>,
    source_ranks: BTreeMap<SourceName, usize>,
}

/// Deterministic merge of N ranked lists into one ordering.
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Fuse every variant's lists into a single descending ordering.
    ///
    /// Contribution per (variant, source, rank) triple is
    /// `variant_weight * source_weight * 1/(k + rank)` with 1-based ranks.
    /// Deduplication is by doc_id; the snippet kept comes from the
    /// numerically smallest contributing rank (ties broken by source order).
    /// Final order: fused score descending, then smallest contributing rank,
    /// then lexicographic doc_id.
    pub fn fuse(&self, variants: &[QueryVariant]) -> Vec<FusionResult> {
        let k = f64::from(self.config.rrf_k);
        let mut docs: HashMap<String, DocAccumulator> = HashMap::new();

        for variant in variants {
            for weighted in &variant.lists {
                for (idx, hit) in weighted.list.iter().enumerate() {
                    // Position in the list is authoritative; a stale
                    // `source_rank` field cannot skew fusion.
                    let rank = idx + 1;
                    let value = variant.weight * weighted.source_weight / (k + rank as f64);

                    let acc = docs
                        .entry(hit.doc_id.clone())
                        .or_insert_with(|| {
                            let mut best = hit.clone();
                            best.source_rank = rank;
                            DocAccumulator {
                                best,
                                contributions: Vec::new(),
                                sources: BTreeSet::new(),
                                source_ranks: BTreeMap::new(),
                            }
                        });

                    acc.contributions.push(Contribution {
                        rank,
                        source: hit.source,
                        value,
                    });
                    acc.sources.insert(hit.source);
                    acc.source_ranks
                        .entry(hit.source)
                        .and_modify(|r| *r = (*r).min(rank))
                        .or_insert(rank);

                    if Self::stronger_signal(hit, rank, &acc.best) {
                        acc.best = hit.clone();
                        acc.best.source_rank = rank;
                    }
                }
            }
        }

        let mut fused: Vec<FusionResult> = docs
            .into_iter()
            .map(|(_, mut acc)| {
                // Sum in a fixed order so identical inputs produce
                // bit-identical scores no matter how the inputs were iterated.
                acc.contributions.sort_by(|a, b| {
                    (a.rank, a.source, a.value.to_bits())
                        .cmp(&(b.rank, b.source, b.value.to_bits()))
                });
                let fused_score: f64 = acc.contributions.iter().map(|c| c.value).sum();

                FusionResult {
                    result: acc.best,
                    fused_score,
                    sources: acc.sources,
                    source_ranks: acc.source_ranks,
                }
            })
            .collect();

        fused.sort_by(|a, b| {
            b.fused_score
                .total_cmp(&a.fused_score)
                .then_with(|| a.min_rank().cmp(&b.min_rank()))
                .then_with(|| a.doc_id().cmp(b.doc_id()))
        });

        debug!(
            variants = variants.len(),
            documents = fused.len(),
            "rank fusion complete"
        );
        fused
    }

    /// Convenience for the single-query case.
    pub fn fuse_single(&self, lists: Vec<WeightedList>) -> Vec<FusionResult> {
        let variant = QueryVariant { weight: 1.0, lists };
        self.fuse(std::slice::from_ref(&variant))
    }

    /// Whether `hit` at `rank` is a stronger single signal than the current
    /// best. Smaller rank wins; rank ties resolve by source order so the
    /// choice never depends on input iteration order.
    fn stronger_signal(hit: &ScoredResult, rank: usize, best: &ScoredResult) -> bool {
        (rank, hit.source) < (best.source_rank, best.source)
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}
