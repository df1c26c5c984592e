/// Fathom system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hard cap on `top_k` regardless of caller request.
pub const MAX_TOP_K: usize = 200;

/// Maximum number of expanded query variants considered per request.
pub const MAX_EXPANSION_VARIANTS: usize = 4;

/// Maximum number of candidates ever handed to a reranker in one call.
pub const MAX_RERANK_CANDIDATES: usize = 100;
