use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Which retriever produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Semantic,
    Keyword,
    Hybrid,
}

/// One retrieved document, normalized at the retrieval boundary.
///
/// `metadata` is the full stored payload; provenance fields (`source`) are
/// read out of it, including the nested `metadata.metadata.source` shape some
/// producers emit. `score` is normalized to [0, 1] by the producing retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedRecord {
    pub text: String,
    pub metadata: Map<String, Value>,
    pub score: f32,
    pub method: SearchMethod,
}

impl RetrievedRecord {
    /// Provenance identifier, tolerating nested producer payload shapes.
    pub fn source(&self) -> Option<String> {
        if let Some(s) = self.metadata.get("source").and_then(Value::as_str) {
            return Some(s.to_string());
        }
        self.metadata
            .get("metadata")
            .and_then(Value::as_object)
            .and_then(|m| m.get("source"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// A retrieved record after score fusion.
///
/// `method` is `Hybrid` when both retrievers produced the same (normalized)
/// text; otherwise it carries the originating retriever's tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedResult {
    #[serde(flatten)]
    pub record: RetrievedRecord,
    pub final_score: f32,
    pub fused_method: SearchMethod,
}

/// RAG query request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub filters: Option<HashMap<String, String>>,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_top_k() -> usize {
    5
}

fn default_use_cache() -> bool {
    true
}

/// Preview of one retrieved document attached to query responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocPreview {
    pub text: String,
    pub score: f32,
    pub source: Option<String>,
}

/// Snapshot of response-cache counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage in [0, 100]; 0 when no lookups have happened yet.
    pub hit_rate: f64,
}
