use async_trait::async_trait;

use crate::Result;

/// Delivers a text message to a destination (a chat id for Telegram).
///
/// An `Err` means the message was not delivered; callers rely on that to
/// decide whether a listing may be marked as notified.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, destination: &str, message: &str) -> Result<()>;
}
