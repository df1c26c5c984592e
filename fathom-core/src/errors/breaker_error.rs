/// Circuit breaker rejections.
#[derive(Debug, thiserror::Error)]
pub enum BreakerError {
    #[error("circuit open for {dependency}, next probe in {retry_in_ms}ms")]
    Open {
        dependency: String,
        retry_in_ms: u64,
    },
}
