//! Error taxonomy for the retrieval core.
//!
//! Only conditions that make it impossible to produce any meaningful result
//! surface as errors. Everything else degrades locally and is reported
//! through [`crate::types::SearchMetadata`].

mod breaker_error;
mod cache_error;
mod retrieval_error;

pub use breaker_error::BreakerError;
pub use cache_error::CacheError;
pub use retrieval_error::RetrievalError;

/// Top-level error type aggregating all subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum FathomError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Breaker(#[from] BreakerError),

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Convenience result alias used across the workspace.
pub type FathomResult<T> = Result<T, FathomError>;
