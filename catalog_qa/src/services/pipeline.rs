use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use catalog_models::{DocPreview, FusedResult, QueryPayload, QueryRequest, QueryResponse};
use catalog_observability::metrics::{MetricsCollector, RequestRecord};

use crate::errors::{QaError, QaResult};
use crate::services::assembler::AnswerAssembler;
use crate::services::cache::ResponseCache;
use crate::services::extractor::GroundedExtractor;
use crate::services::fusion::ResultFuser;
use crate::services::intent::classify;
use crate::services::retrieval::Retriever;

const MAX_TOP_K: usize = 50;
const PREVIEW_DOCS: usize = 3;
const PREVIEW_CHARS: usize = 200;

/// End-to-end query pipeline: cache lookup, hybrid retrieval, fusion,
/// grounded extraction, answer assembly.
pub struct QueryPipeline {
    semantic: Arc<dyn Retriever>,
    keyword: Arc<dyn Retriever>,
    fuser: ResultFuser,
    extractor: GroundedExtractor,
    cache: Arc<ResponseCache>,
    metrics: Arc<MetricsCollector>,
}

impl QueryPipeline {
    pub fn new(
        semantic: Arc<dyn Retriever>,
        keyword: Arc<dyn Retriever>,
        fuser: ResultFuser,
        extractor: GroundedExtractor,
        cache: Arc<ResponseCache>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            semantic,
            keyword,
            fuser,
            extractor,
            cache,
            metrics,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Handle one query request. Records request metrics regardless of
    /// outcome.
    pub async fn execute(&self, request: &QueryRequest) -> QaResult<QueryResponse> {
        let start = Instant::now();
        let outcome = self.run(request, start).await;

        let (succeeded, cache_hit) = match &outcome {
            Ok(response) => (true, response.cache_hit),
            Err(_) => (false, false),
        };
        self.metrics.record(RequestRecord {
            endpoint: "/query",
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            succeeded,
            cache_hit,
        });

        outcome
    }

    async fn run(&self, request: &QueryRequest, start: Instant) -> QaResult<QueryResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(QaError::Validation("query must not be empty".to_string()));
        }
        if request.top_k == 0 || request.top_k > MAX_TOP_K {
            return Err(QaError::Validation(format!(
                "top_k must be between 1 and {}",
                MAX_TOP_K
            )));
        }

        if request.use_cache {
            if let Some(payload) =
                self.cache
                    .get::<QueryPayload>(query, request.filters.as_ref())
            {
                info!(query = %query, "cache hit");
                return Ok(QueryResponse {
                    cache_hit: true,
                    processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
                    payload,
                });
            }
        }

        // Both arms fetch wide so fusion has enough overlap to work with.
        let fetch = request.top_k * 2;
        let (semantic, keyword) = tokio::join!(
            self.semantic.retrieve(query, fetch),
            self.keyword.retrieve(query, fetch),
        );
        let semantic = semantic?;
        let keyword = keyword.unwrap_or_else(|e| {
            warn!("keyword retrieval failed, continuing without it: {}", e);
            Vec::new()
        });

        let fused = self.fuser.fuse(&semantic, &keyword, request.top_k);
        let context = fused
            .iter()
            .map(|r| r.record.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let facts = self.extractor.extract(&context, query).await;
        let known_fonts: Vec<String> = facts.fonts.iter().map(|f| f.name.clone()).collect();
        let matched = classify(query, &known_fonts);

        let answer = AnswerAssembler::assemble(query, &matched, &facts, &fused);
        let payload = QueryPayload {
            answer,
            retrieved: previews(&fused),
        };

        if request.use_cache {
            if let Err(e) = self
                .cache
                .set(query, request.filters.as_ref(), &payload, None)
            {
                warn!("failed to cache response: {}", e);
            }
        }

        info!(
            query = %query,
            results = fused.len(),
            intent = ?matched.intent,
            "query processed"
        );

        Ok(QueryResponse {
            cache_hit: false,
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            payload,
        })
    }
}

fn previews(fused: &[FusedResult]) -> Vec<DocPreview> {
    fused
        .iter()
        .take(PREVIEW_DOCS)
        .map(|r| DocPreview {
            text: truncate_chars(&r.record.text, PREVIEW_CHARS),
            score: r.final_score,
            source: r.record.source(),
        })
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
