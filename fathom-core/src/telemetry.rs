//! Structured tracing setup and per-operation span macros.

use tracing_subscriber::EnvFilter;

use crate::config::defaults::DEFAULT_LOG_LEVEL;

/// Initialize the global tracing subscriber.
///
/// Filter precedence: explicit argument, then `FATHOM_LOG` env var, then the
/// configured default level. Safe to call more than once; later calls are
/// no-ops.
pub fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_env("FATHOM_LOG")
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Create a search span.
#[macro_export]
macro_rules! search_span {
    ($query:expr, $top_k:expr) => {
        tracing::info_span!("fathom.search", query = %$query, top_k = $top_k)
    };
}

/// Create a fusion span.
#[macro_export]
macro_rules! fusion_span {
    ($lists:expr) => {
        tracing::info_span!("fathom.fusion", lists = $lists)
    };
}

/// Create a rerank span.
#[macro_export]
macro_rules! rerank_span {
    ($strategy:expr, $candidates:expr) => {
        tracing::info_span!("fathom.rerank", strategy = %$strategy, candidates = $candidates)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const SEARCH: &str = "fathom.search";
    pub const FUSION: &str = "fathom.fusion";
    pub const RERANK: &str = "fathom.rerank";
}
