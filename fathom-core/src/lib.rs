//! # fathom-core
//!
//! Foundation crate for the Fathom retrieval core.
//! Defines all types, ports, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::FathomConfig;
pub use errors::{FathomError, FathomResult};
pub use types::{
    CacheKey, FusionResult, RankedList, ScoredResult, SearchMetadata, SearchQuery, SourceName,
};
