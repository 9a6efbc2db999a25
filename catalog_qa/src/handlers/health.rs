use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::services::VectorStoreService;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub collection: String,
    pub collection_available: bool,
}

/// Health endpoint. `degraded` when the vector collection is unreachable;
/// the service still answers from cache in that state.
pub async fn health_handler(store: web::Data<Arc<VectorStoreService>>) -> HttpResponse {
    let available = store.collection_exists().await.unwrap_or(false);
    HttpResponse::Ok().json(HealthResponse {
        status: if available { "healthy" } else { "degraded" },
        collection: store.collection_name().to_string(),
        collection_available: available,
    })
}
