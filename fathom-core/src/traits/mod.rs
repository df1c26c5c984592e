//! Ports implemented by external collaborators.
//!
//! Implementations live outside this workspace (vector stores, BM25 engines,
//! cross-encoder services). The core only depends on these narrow contracts,
//! so every component is testable with substitutes.

mod embedder;
mod expander;
mod reranker;
mod retriever;

pub use embedder::Embedder;
pub use expander::QueryExpander;
pub use reranker::Reranker;
pub use retriever::Retriever;
