use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use catalog_config::Settings;
use catalog_observability::{info, init_tracing, request_logger, MetricsCollector, TracingConfig};

mod errors;
mod handlers;
mod llm;
mod models;
mod services;

use handlers::{
    cache_cleanup_handler, cache_clear_handler, cache_stats_handler, health_handler,
    metrics_handler, query_handler,
};
use models::{create_completion_client, create_embedding_client};
use services::{
    GroundedExtractor, KeywordRetriever, QueryPipeline, ResponseCache, ResultFuser,
    SemanticRetriever, VectorStoreService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing(TracingConfig::for_service("catalog-qa"));

    let settings = Settings::from_env();
    info!(
        "Starting catalog QA service on {}:{}",
        settings.host, settings.port
    );

    let store = Arc::new(
        VectorStoreService::new(
            &settings.qdrant_url,
            settings.qdrant_api_key.clone(),
            &settings.collection_name,
            30,
        )
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );

    let embedder = create_embedding_client(&settings)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let completion = create_completion_client(&settings);
    match &completion {
        Some(_) => info!("completion model enabled for extraction drafts"),
        None => info!("no completion model configured; deterministic extraction only"),
    }

    let semantic = Arc::new(SemanticRetriever::new(embedder, store.clone()));
    let keyword = Arc::new(KeywordRetriever::new(store.clone()));
    let pipeline = Arc::new(QueryPipeline::new(
        semantic,
        keyword,
        ResultFuser::new(settings.semantic_weight, settings.keyword_weight),
        GroundedExtractor::new(completion, settings.completion_timeout),
        Arc::new(ResponseCache::new(settings.cache_max_size, settings.cache_ttl)),
        Arc::new(MetricsCollector::new()),
    ));

    let host = settings.host.clone();
    let port = settings.port;

    info!("Starting HTTP server...");
    HttpServer::new(move || {
        App::new()
            .wrap(request_logger("catalog-qa"))
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(store.clone()))
            .route("/health", web::get().to(health_handler))
            .route("/query", web::post().to(query_handler))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/cache/stats", web::get().to(cache_stats_handler))
            .route("/cache/clear", web::post().to(cache_clear_handler))
            .route("/cache/cleanup", web::post().to(cache_cleanup_handler))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
