use async_trait::async_trait;

use crate::providers::ProviderError;

/// Outbound message transport (Telegram in production, a recording fake in
/// tests). Best-effort delivery: failures come back as errors, never panic
/// and never surface asynchronously.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send `text` to the chat identified by `user_id`. When `html` is set
    /// the text is already HTML-formatted for the transport.
    async fn send(&self, user_id: i64, text: &str, html: bool) -> anyhow::Result<()>;
}

/// External text-completion collaborator. One call per generated document:
/// system instructions + user request in, plain text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError>;
}
