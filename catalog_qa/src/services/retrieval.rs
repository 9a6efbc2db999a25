use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use catalog_models::{RetrievedRecord, SearchMethod};

use crate::errors::{QaError, QaResult};
use crate::llm::EmbeddingClient;
use crate::services::keywords::extract_keywords;
use crate::services::vector_store::{build_keyword_filter, VectorStoreService};

/// Lexical filters use at most this many keywords; truncation is
/// deterministic (first-appearance order).
const MAX_FILTER_KEYWORDS: usize = 5;

/// Normalize a stored payload into a `RetrievedRecord` at the retrieval
/// boundary, so the rest of the pipeline never branches on producer shape.
fn record_from_payload(
    payload: Option<Map<String, Value>>,
    score: f32,
    method: SearchMethod,
) -> RetrievedRecord {
    let metadata = payload.unwrap_or_default();
    let text = metadata
        .get("page_content")
        .or_else(|| metadata.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    RetrievedRecord {
        text,
        metadata,
        score: score.clamp(0.0, 1.0),
        method,
    }
}

/// Common retrieval interface; the pipeline holds both arms through it.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, top_k: usize) -> QaResult<Vec<RetrievedRecord>>;
}

/// Semantic retrieval: embed the query, nearest-neighbor search the index.
/// Failure here is fatal to the request.
pub struct SemanticRetriever {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<VectorStoreService>,
}

impl SemanticRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<VectorStoreService>) -> Self {
        Self { embedder, store }
    }

    pub async fn search(&self, query: &str, top_k: usize) -> QaResult<Vec<RetrievedRecord>> {
        let query_vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| QaError::Connection(format!("embedding failed: {}", e)))?;

        let hits = self
            .store
            .search(query_vector, top_k)
            .await
            .map_err(|e| QaError::Connection(format!("vector search failed: {}", e)))?;

        let results: Vec<RetrievedRecord> = hits
            .into_iter()
            .map(|hit| record_from_payload(hit.payload, hit.score, SearchMethod::Semantic))
            .collect();

        debug!(count = results.len(), "semantic search returned results");
        Ok(results)
    }
}

#[async_trait]
impl Retriever for SemanticRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> QaResult<Vec<RetrievedRecord>> {
        self.search(query, top_k).await
    }
}

/// Keyword retrieval: match-any text filter, scored by keyword frequency.
/// Best-effort: store failures degrade to an empty candidate list.
pub struct KeywordRetriever {
    store: Arc<VectorStoreService>,
}

impl KeywordRetriever {
    pub fn new(store: Arc<VectorStoreService>) -> Self {
        Self { store }
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Vec<RetrievedRecord> {
        let mut keywords = extract_keywords(query);
        if keywords.is_empty() {
            warn!("no keywords extracted from query");
            return Vec::new();
        }
        keywords.truncate(MAX_FILTER_KEYWORDS);

        let filter = build_keyword_filter(&keywords);
        let hits = match self.store.scroll(filter, top_k * 2).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("keyword search failed, continuing without it: {}", e);
                return Vec::new();
            }
        };

        let mut results: Vec<RetrievedRecord> = hits
            .into_iter()
            .map(|hit| {
                let mut record = record_from_payload(hit.payload, 0.0, SearchMethod::Keyword);
                record.score = score_by_frequency(&record.text, &keywords);
                record
            })
            .collect();

        // Stable sort keeps scan order for equal scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        debug!(count = results.len(), "keyword search returned results");
        results
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> QaResult<Vec<RetrievedRecord>> {
        Ok(self.search(query, top_k).await)
    }
}

/// Score a candidate by whole-word keyword occurrences, normalized to [0, 1].
fn score_by_frequency(text: &str, keywords: &[String]) -> f32 {
    let mut occurrences = 0usize;
    for kw in keywords {
        if let Ok(re) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw))) {
            occurrences += re.find_iter(text).count();
        }
    }
    (occurrences as f32 / (keywords.len() + 1) as f32).min(1.0)
}
