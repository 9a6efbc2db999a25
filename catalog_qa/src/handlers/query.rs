use std::sync::Arc;

use actix_web::{web, HttpResponse};

use catalog_models::QueryRequest;

use crate::errors::QaError;
use crate::services::QueryPipeline;

/// Query endpoint: answers a natural-language catalog question.
pub async fn query_handler(
    req: web::Json<QueryRequest>,
    pipeline: web::Data<Arc<QueryPipeline>>,
) -> Result<HttpResponse, QaError> {
    let response = pipeline.execute(&req).await?;
    Ok(HttpResponse::Ok().json(response))
}
