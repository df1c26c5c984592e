// Single source of truth for all default values.

// --- Fusion ---
pub const DEFAULT_RRF_K: u32 = 60;

// --- Retrieval ---
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_RERANK_CANDIDATE_FACTOR: usize = 2;
pub const DEFAULT_QUERY_EXPANSION: bool = false;

// --- Rerank ---
pub const DEFAULT_RERANK_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MIN_RERANK_SCORE: f64 = 0.0;

// --- Cache ---
pub const DEFAULT_CACHE_CAPACITY: usize = 1_000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.92;
pub const DEFAULT_SIMILARITY_CACHE: bool = false;

// --- Circuit breaker ---
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RECOVERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 3;
pub const DEFAULT_FAILURE_WINDOW_SECS: u64 = 30;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
