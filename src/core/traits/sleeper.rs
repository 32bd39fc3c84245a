use std::time::Duration;

/// Suspension between polls. Swapped out in tests so polling runs without
/// real delays.
#[async_trait::async_trait]
pub trait Sleeper: std::fmt::Debug + Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
