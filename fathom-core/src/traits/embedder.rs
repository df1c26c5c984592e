use async_trait::async_trait;

use crate::errors::FathomResult;

/// Produces a query embedding for the similarity cache.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> FathomResult<Vec<f32>>;
}
