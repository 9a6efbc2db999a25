use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::services::QueryPipeline;

/// Cache counters and occupancy.
pub async fn cache_stats_handler(pipeline: web::Data<Arc<QueryPipeline>>) -> HttpResponse {
    HttpResponse::Ok().json(pipeline.cache().stats())
}

/// Drop every cache entry.
pub async fn cache_clear_handler(pipeline: web::Data<Arc<QueryPipeline>>) -> HttpResponse {
    let removed = pipeline.cache().clear();
    HttpResponse::Ok().json(json!({ "cleared": removed }))
}

/// Purge expired entries without touching live ones.
pub async fn cache_cleanup_handler(pipeline: web::Data<Arc<QueryPipeline>>) -> HttpResponse {
    let removed = pipeline.cache().cleanup();
    HttpResponse::Ok().json(json!({ "removed": removed }))
}

/// Aggregated request metrics since process start.
pub async fn metrics_handler(pipeline: web::Data<Arc<QueryPipeline>>) -> HttpResponse {
    HttpResponse::Ok().json(pipeline.metrics().snapshot())
}
