use async_trait::async_trait;

use crate::errors::FathomResult;

/// Produces alternate phrasings of a query, each with a weight.
///
/// Failure of this collaborator degrades the request to single-query mode;
/// it never fails the request.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    async fn expand(&self, query: &str) -> FathomResult<Vec<(String, f64)>>;
}
