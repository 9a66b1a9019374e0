use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::plugins::traits::Notifier;
use crate::Result;

/// Enforces a minimum pause between consecutive deliveries of the wrapped
/// notifier. Deliveries are serialized; failed attempts count too.
pub struct Throttled<N> {
    inner: N,
    spacing: Duration,
    last_delivery: Mutex<Option<Instant>>,
}

impl<N: Notifier> Throttled<N> {
    pub fn new(inner: N, spacing: Duration) -> Self {
        Self {
            inner,
            spacing,
            last_delivery: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }
}

#[async_trait]
impl<N: Notifier> Notifier for Throttled<N> {
    async fn deliver(&self, destination: &str, message: &str) -> Result<()> {
        let mut last = self.last_delivery.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.spacing;
            if Instant::now() < ready_at {
                tracing::debug!(wait_ms = (ready_at - Instant::now()).as_millis() as u64, "Waiting for delivery slot");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let result = self.inner.deliver(destination, message).await;
        *last = Some(Instant::now());
        result
    }
}
