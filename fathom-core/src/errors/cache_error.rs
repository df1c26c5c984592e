/// Cache subsystem errors.
///
/// Always recovered locally: a read failure is treated as a miss, a write
/// failure as a silent no-op. Never blocks or fails a request.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {reason}")]
    Unavailable { reason: String },
}
