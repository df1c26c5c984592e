//! Configuration for every subsystem, loadable from TOML.
//!
//! All defaults live in [`defaults`] as the single source of truth; every
//! config struct is `#[serde(default)]` so a partial TOML file only overrides
//! what it names.

pub mod defaults;

mod breaker_config;
mod cache_config;
mod fusion_config;
mod rerank_config;
mod retrieval_config;

pub use breaker_config::BreakerConfig;
pub use cache_config::CacheConfig;
pub use fusion_config::FusionConfig;
pub use rerank_config::RerankConfig;
pub use retrieval_config::RetrievalConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{FathomError, FathomResult};

/// Aggregated configuration for the whole retrieval core.
///
/// Built once at process start and passed by reference into constructors;
/// there is no global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FathomConfig {
    pub retrieval: RetrievalConfig,
    pub fusion: FusionConfig,
    pub cache: CacheConfig,
    pub rerank: RerankConfig,
    pub breaker: BreakerConfig,
}

impl FathomConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> FathomResult<Self> {
        toml::from_str(s).map_err(|e| FathomError::Config {
            reason: e.to_string(),
        })
    }

    /// Load a configuration from a TOML file on disk.
    pub fn load(path: &std::path::Path) -> FathomResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FathomError::Config {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }
}
