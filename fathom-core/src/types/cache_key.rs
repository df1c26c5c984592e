use serde::{Deserialize, Serialize};

use crate::types::SearchQuery;

/// Deterministic cache key over (normalized query, top_k, filters, weights).
///
/// Two queries that normalize to the same text with identical parameters
/// always hash to the same key, independent of map insertion order (both
/// filter and weight maps are ordered).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_query(query: &SearchQuery) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(query.normalized().as_bytes());
        hasher.update(&(query.top_k() as u64).to_le_bytes());

        for (k, v) in query.filters() {
            hasher.update(b"\x00f");
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
        }
        for (source, weight) in query.source_weights() {
            hasher.update(b"\x00w");
            hasher.update(source.to_string().as_bytes());
            // Bit-exact float hashing; formatting would lose precision.
            hasher.update(&weight.to_bits().to_le_bytes());
        }

        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
