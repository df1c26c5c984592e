/// Retrieval subsystem errors.
///
/// `Display` and `Error` are implemented by hand because `thiserror`'s
/// derive treats any field named `source` as the error's source, which
/// requires it to implement `Error` — these are plain `String` labels.
#[derive(Debug)]
pub enum RetrievalError {
    InvalidQuery { reason: String },

    AllSourcesUnavailable { attempted: usize },

    SourceFailed { source: String, reason: String },

    SourceTimeout { source: String, elapsed_ms: u64 },

    RerankFailed { strategy: String, reason: String },

    EmbeddingFailed { reason: String },

    ExpansionFailed { reason: String },
}

impl std::fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { reason } => write!(f, "invalid query: {reason}"),
            Self::AllSourcesUnavailable { attempted } => {
                write!(f, "all {attempted} configured sources failed or timed out")
            }
            Self::SourceFailed { source, reason } => {
                write!(f, "source {source} failed: {reason}")
            }
            Self::SourceTimeout { source, elapsed_ms } => {
                write!(f, "source {source} timed out after {elapsed_ms}ms")
            }
            Self::RerankFailed { strategy, reason } => {
                write!(f, "reranker {strategy} failed: {reason}")
            }
            Self::EmbeddingFailed { reason } => write!(f, "embedding failed: {reason}"),
            Self::ExpansionFailed { reason } => write!(f, "query expansion failed: {reason}"),
        }
    }
}

impl std::error::Error for RetrievalError {}
