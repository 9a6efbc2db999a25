use anyhow::Result;
use async_trait::async_trait;

/// Embedding provider seam. The pipeline only needs a query vector of the
/// index's fixed dimension; which provider produces it is a deployment choice.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Generative completion seam. Output is an untrusted hint: callers must
/// validate everything it proposes and survive errors, timeouts, and
/// malformed text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
