// src/notify/mod.rs
pub mod telegram;

use anyhow::Result;

/// Outbound notification channel. Takes an already formatted message;
/// the layout of an article into a message lives on `Article` itself.
#[async_trait::async_trait]
pub trait DispatchSink: Send + Sync {
    async fn post(&self, text: &str) -> Result<()>;
    fn name(&self) -> &str;
}
