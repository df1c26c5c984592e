//! One breaker per dependency name, created lazily on first use.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use fathom_core::clock::{Clock, SystemClock};
use fathom_core::config::BreakerConfig;

use crate::breaker::{BreakerSnapshot, CircuitBreaker};

/// Thread-safe registry of named circuit breakers.
///
/// Shared across all concurrent requests; breakers persist for the process
/// lifetime.
pub struct BreakerRegistry {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Registry with an injected clock, for deterministic tests.
    pub fn with_clock(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            breakers: DashMap::new(),
        }
    }

    /// Get the breaker for a dependency, creating it on first use.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    name,
                    self.config.clone(),
                    Arc::clone(&self.clock),
                ))
            })
            .clone()
    }

    /// Snapshot every registered breaker, keyed by dependency name.
    pub fn snapshots(&self) -> BTreeMap<String, BreakerSnapshot> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
