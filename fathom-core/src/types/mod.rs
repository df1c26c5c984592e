//! Shared data model: queries, per-source results, fused results, metadata.

mod cache_key;
mod fusion;
mod metadata;
mod query;
mod result;

pub use cache_key::CacheKey;
pub use fusion::FusionResult;
pub use metadata::{CacheOutcome, DegradationFlags, SearchMetadata};
pub use query::SearchQuery;
pub use result::{RankedList, ScoredResult, SourceName};
