#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    use catalog_models::{QueryRequest, RetrievedRecord, SearchMethod, StructuredAnswer};
    use catalog_observability::metrics::MetricsCollector;

    use crate::errors::{QaError, QaResult};
    use crate::services::{
        GroundedExtractor, QueryPipeline, ResponseCache, ResultFuser, Retriever,
    };

    struct StubRetriever {
        records: Vec<RetrievedRecord>,
        fail: bool,
    }

    impl StubRetriever {
        fn with(records: Vec<RetrievedRecord>) -> Arc<Self> {
            Arc::new(Self {
                records,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                records: Vec::new(),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> QaResult<Vec<RetrievedRecord>> {
            if self.fail {
                return Err(QaError::Connection("store unreachable".to_string()));
            }
            Ok(self.records.clone())
        }
    }

    fn record(text: &str, score: f32, method: SearchMethod, source: &str) -> RetrievedRecord {
        let metadata: Map<String, Value> = json!({"source": source})
            .as_object()
            .cloned()
            .unwrap_or_default();
        RetrievedRecord {
            text: text.to_string(),
            metadata,
            score,
            method,
        }
    }

    fn pipeline(semantic: Arc<StubRetriever>, keyword: Arc<StubRetriever>) -> QueryPipeline {
        QueryPipeline::new(
            semantic,
            keyword,
            ResultFuser::default(),
            GroundedExtractor::deterministic_only(),
            Arc::new(ResponseCache::new(16, Duration::from_secs(300))),
            Arc::new(MetricsCollector::new()),
        )
    }

    fn request(query: &str) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            top_k: 5,
            filters: None,
            use_cache: true,
        }
    }

    #[tokio::test]
    async fn test_finishes_query_end_to_end() {
        let doc = "Finish option for Cast Metal: Brushed";
        let semantic = StubRetriever::with(vec![
            record(doc, 0.9, SearchMethod::Semantic, "finishes.pdf"),
            record(
                "Finish option for Cast Metal: Polished",
                0.8,
                SearchMethod::Semantic,
                "finishes.pdf",
            ),
        ]);
        let keyword =
            StubRetriever::with(vec![record(doc, 0.6, SearchMethod::Keyword, "finishes.pdf")]);

        let response = pipeline(semantic, keyword)
            .execute(&request("What finishes are available for cast metal?"))
            .await
            .unwrap();

        assert!(!response.cache_hit);
        match &response.payload.answer {
            StructuredAnswer::Finishes(a) => {
                assert_eq!(a.material.as_deref(), Some("Cast Metal"));
                assert_eq!(a.finishes, vec!["Brushed", "Polished"]);
                assert_eq!(a.sources, vec!["finishes.pdf"]);
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
        // The doc both retrievers returned keeps its fused rank at the top.
        assert_eq!(
            response.payload.retrieved[0].text,
            "Finish option for Cast Metal: Brushed"
        );
    }

    #[tokio::test]
    async fn test_font_attribute_query_resolves_target_and_values() {
        let semantic = StubRetriever::with(vec![
            record(
                "Font: Garamond | Height: 2 | Depth: 1/2",
                0.9,
                SearchMethod::Semantic,
                "fonts.xlsx",
            ),
            record(
                "Font: Garamond | Height: 3 | Depth: 3/4",
                0.85,
                SearchMethod::Semantic,
                "fonts.xlsx",
            ),
        ]);
        let keyword = StubRetriever::with(Vec::new());

        let response = pipeline(semantic, keyword)
            .execute(&request("What heights are available for Garamond?"))
            .await
            .unwrap();

        match &response.payload.answer {
            StructuredAnswer::FontAttribute(a) => {
                assert_eq!(a.font_name, "Garamond");
                assert_eq!(a.values, vec!["2", "3"]);
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repeat_query_is_served_from_cache_byte_identical() {
        let semantic = StubRetriever::with(vec![record(
            "Mounting option for Bronze: Stud mount",
            0.9,
            SearchMethod::Semantic,
            "mounting.pdf",
        )]);
        let keyword = StubRetriever::with(Vec::new());
        let pipeline = pipeline(semantic, keyword);
        let req = request("How is bronze mounted?");

        let first = pipeline.execute(&req).await.unwrap();
        let second = pipeline.execute(&req).await.unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(
            serde_json::to_vec(&first.payload).unwrap(),
            serde_json::to_vec(&second.payload).unwrap()
        );

        let stats = pipeline.cache().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_cache_disabled_requests_bypass_the_cache() {
        let semantic = StubRetriever::with(Vec::new());
        let keyword = StubRetriever::with(Vec::new());
        let pipeline = pipeline(semantic, keyword);
        let mut req = request("anything here");
        req.use_cache = false;

        pipeline.execute(&req).await.unwrap();
        let second = pipeline.execute(&req).await.unwrap();

        assert!(!second.cache_hit);
        assert_eq!(pipeline.cache().stats().size, 0);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let pipeline = pipeline(
            StubRetriever::with(Vec::new()),
            StubRetriever::with(Vec::new()),
        );
        let err = pipeline.execute(&request("   ")).await.unwrap_err();
        assert!(matches!(err, QaError::Validation(_)));
    }

    #[tokio::test]
    async fn test_top_k_bounds_are_enforced() {
        let pipeline = pipeline(
            StubRetriever::with(Vec::new()),
            StubRetriever::with(Vec::new()),
        );
        let mut req = request("finishes?");
        req.top_k = 0;
        assert!(matches!(
            pipeline.execute(&req).await.unwrap_err(),
            QaError::Validation(_)
        ));
        req.top_k = 51;
        assert!(matches!(
            pipeline.execute(&req).await.unwrap_err(),
            QaError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_semantic_failure_is_fatal() {
        let pipeline = pipeline(StubRetriever::failing(), StubRetriever::with(Vec::new()));
        let err = pipeline.execute(&request("finishes?")).await.unwrap_err();
        assert!(matches!(err, QaError::Connection(_)));

        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_keyword_failure_degrades_to_semantic_only() {
        let semantic = StubRetriever::with(vec![record(
            "Material available: Bronze",
            0.9,
            SearchMethod::Semantic,
            "materials.pdf",
        )]);

        let response = pipeline(semantic, StubRetriever::failing())
            .execute(&request("What materials do you offer?"))
            .await
            .unwrap();

        match &response.payload.answer {
            StructuredAnswer::Material(a) => {
                assert_eq!(a.material.as_deref(), Some("Bronze"));
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_answer_values_are_grounded_in_retrieved_context() {
        let doc = "Finish option for Aluminum: Anodized";
        let semantic =
            StubRetriever::with(vec![record(doc, 0.9, SearchMethod::Semantic, "finishes.pdf")]);

        let response = pipeline(semantic, StubRetriever::with(Vec::new()))
            .execute(&request("What finishes does aluminum come in?"))
            .await
            .unwrap();

        let ctx_lower = doc.to_lowercase();
        match &response.payload.answer {
            StructuredAnswer::Finishes(a) => {
                assert!(!a.finishes.is_empty());
                for finish in &a.finishes {
                    assert!(ctx_lower.contains(&finish.to_lowercase()));
                }
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
    }
}
