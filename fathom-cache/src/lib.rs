//! # fathom-cache
//!
//! Result cache for the retrieval core. Exact-key lookups are backed by a
//! bounded map with strict LRU eviction and independent TTL expiry; an
//! optional similarity probe reuses results for near-duplicate queries by
//! cosine similarity over stored query embeddings.
//!
//! Published values are immutable (`Arc<[FusionResult]>`) and deep-copied on
//! insert, so no caller ever holds a mutable reference into a cache entry.

mod similarity;
mod store;

pub use similarity::cosine_similarity;
pub use store::{CacheStore, CachedValue};
