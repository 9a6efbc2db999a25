use std::env;
use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Runtime settings for the catalog QA service, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    // Vector store
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection_name: String,

    // Model providers
    pub embedding_provider: String,
    pub embedding_model: String,
    pub ollama_url: String,
    pub completion_model: Option<String>,
    pub completion_timeout: Duration,

    // Fusion
    pub semantic_weight: f32,
    pub keyword_weight: f32,

    // Response cache
    pub cache_max_size: usize,
    pub cache_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let completion_model = env::var("COMPLETION_MODEL").ok().filter(|m| !m.is_empty());

        Self {
            host: env_or("CATALOG_QA_HOST", "0.0.0.0"),
            port: env_parse("CATALOG_QA_PORT", 8086),
            qdrant_url: env_or("QDRANT_URL", "http://localhost:6333"),
            qdrant_api_key: env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty()),
            collection_name: env_or("QDRANT_COLLECTION_NAME", "catalog_docs"),
            embedding_provider: env_or("EMBEDDING_PROVIDER", "ollama"),
            embedding_model: env_or("EMBEDDING_MODEL", "nomic-embed-text"),
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            completion_model,
            completion_timeout: Duration::from_secs(env_parse("COMPLETION_TIMEOUT_SECONDS", 20)),
            semantic_weight: env_parse("SEMANTIC_WEIGHT", 0.7),
            keyword_weight: env_parse("KEYWORD_WEIGHT", 0.3),
            cache_max_size: env_parse("CACHE_MAX_SIZE", 1000),
            cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECONDS", 1800)),
        }
    }
}
