//! Tokio-backed [`Sleeper`]

use async_trait::async_trait;
use bridge_traits::time::Sleeper;
use std::time::Duration;

/// Sleeps on the Tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
