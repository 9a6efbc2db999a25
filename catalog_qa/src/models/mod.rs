pub mod ollama;
pub mod openai;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use catalog_config::Settings;

use crate::llm::{CompletionClient, EmbeddingClient};
use ollama::OllamaClient;
use openai::OpenAIEmbeddingClient;

/// Build the embedding client named by `EMBEDDING_PROVIDER`.
pub fn create_embedding_client(settings: &Settings) -> Result<Arc<dyn EmbeddingClient>> {
    match settings.embedding_provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaClient::new(
            settings.ollama_url.clone(),
            settings.embedding_model.clone(),
            settings.completion_model.clone().unwrap_or_default(),
        ))),
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
            Ok(Arc::new(OpenAIEmbeddingClient::new(
                api_key,
                settings.embedding_model.clone(),
            )))
        }
        other => Err(anyhow!("Unknown embedding provider: {}", other)),
    }
}

/// Build the optional completion client. `None` when no completion model is
/// configured; the pipeline then runs on deterministic extraction alone.
pub fn create_completion_client(settings: &Settings) -> Option<Arc<dyn CompletionClient>> {
    settings.completion_model.as_ref().map(|model| {
        Arc::new(OllamaClient::new(
            settings.ollama_url.clone(),
            settings.embedding_model.clone(),
            model.clone(),
        )) as Arc<dyn CompletionClient>
    })
}
