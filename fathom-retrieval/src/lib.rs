//! # fathom-retrieval
//!
//! The retrieval core. Fans out one query to every configured backend
//! concurrently, merges the surviving ranked lists with weighted Reciprocal
//! Rank Fusion, reranks through a fallback chain, and caches the result.
//!
//! ## Architecture
//!
//! ```text
//! RetrievalOrchestrator
//! ├── CacheStore probe (exact key → similarity)
//! ├── QueryExpander (optional, degrades to single-query)
//! ├── Retriever fan-out (per-source timeout + circuit breaker)
//! ├── FusionEngine (weighted RRF, deterministic ordering)
//! ├── RerankerChain (priority order, breaker-gated fallback)
//! └── CacheStore publish (background, best-effort)
//! ```
//!
//! Only two conditions surface as errors: an invalid query and the loss of
//! every configured source. Everything else degrades and is reported in
//! [`fathom_core::types::SearchMetadata`].

pub mod engine;
pub mod fusion;
pub mod rerank;

pub use engine::RetrievalOrchestrator;
pub use fusion::{FusionEngine, QueryVariant, WeightedList};
pub use rerank::{RerankOutcome, RerankerChain};
