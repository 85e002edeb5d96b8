use async_trait::async_trait;
use std::time::Duration;

/// Time source for cache-bust stamps and the UI minimum display window.
#[async_trait(?Send)]
pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait(?Send)]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
