use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Qdrant REST API client for vector operations.
pub struct VectorStoreService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

// ============================================================================
// Qdrant API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Serialize)]
struct ScrollRequest {
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    #[serde(default = "default_status")]
    status: String,
    result: Option<T>,
}

fn default_status() -> String {
    "ok".to_string()
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<ScrollPoint>,
}

#[derive(Debug, Deserialize)]
pub struct ScrollPoint {
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ScoredPoint {
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

impl VectorStoreService {
    pub fn new(base_url: &str, api_key: Option<String>, collection: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            collection: collection.to_string(),
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.base_url,
            urlencoding::encode(&self.collection),
            path
        )
    }

    /// Make an authenticated POST request against the collection.
    async fn post_request<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R> {
        let mut request = self
            .client
            .post(self.api_url(path))
            .header("Content-Type", "application/json")
            .json(body);

        if let Some(key) = &self.api_key {
            request = request.header("api-key", key.clone());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Qdrant API error ({}): {}", status, error_text));
        }

        let body: QdrantResponse<R> = response.json().await?;
        if body.status != "ok" {
            return Err(anyhow!("Qdrant API error: status {}", body.status));
        }

        body.result
            .ok_or_else(|| anyhow!("Qdrant response missing result"))
    }

    /// Nearest-neighbor search over the collection.
    pub async fn search(&self, query_vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredPoint>> {
        let search_req = SearchRequest {
            vector: query_vector,
            limit: top_k,
            with_payload: true,
        };

        self.post_request("/points/search", &search_req).await
    }

    /// Filtered payload scan; no ranking guarantee.
    pub async fn scroll(&self, filter: Option<Value>, limit: usize) -> Result<Vec<ScrollPoint>> {
        let scroll_req = ScrollRequest {
            limit,
            with_payload: true,
            filter,
        };

        let result: ScrollResult = self.post_request("/points/scroll", &scroll_req).await?;
        Ok(result.points)
    }

    /// Check whether the collection exists (used by the health endpoint).
    pub async fn collection_exists(&self) -> Result<bool> {
        let mut request = self.client.get(self.api_url(""));
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key.clone());
        }

        let response = request.send().await?;
        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        Ok(response.status().is_success())
    }
}

// ============================================================================
// Helper Functions for Filter Building
// ============================================================================

/// Build a match-any full-text filter over the stored document text.
pub fn build_keyword_filter(keywords: &[String]) -> Option<Value> {
    if keywords.is_empty() {
        return None;
    }

    let conditions: Vec<Value> = keywords
        .iter()
        .map(|kw| {
            json!({
                "key": "page_content",
                "match": { "text": kw }
            })
        })
        .collect();

    Some(json!({ "should": conditions }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_filter_is_disjunctive() {
        let filter = build_keyword_filter(&["brushed".to_string(), "metal".to_string()]).unwrap();
        let should = filter.get("should").and_then(Value::as_array).unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(
            should[0].pointer("/match/text").and_then(Value::as_str),
            Some("brushed")
        );
    }

    #[test]
    fn test_empty_keywords_build_no_filter() {
        assert!(build_keyword_filter(&[]).is_none());
    }
}
