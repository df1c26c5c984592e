use serde::{Deserialize, Serialize};

use super::defaults;

/// Result cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction.
    pub capacity: usize,
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
    /// Enable the embedding-similarity probe on exact-key miss.
    pub similarity_enabled: bool,
    /// Minimum cosine similarity for a similarity-cache hit.
    pub similarity_threshold: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::DEFAULT_CACHE_CAPACITY,
            ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            similarity_enabled: defaults::DEFAULT_SIMILARITY_CACHE,
            similarity_threshold: defaults::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}
