//! HTTP middleware for request/response logging.
//!
//! Assigns each request an id, logs method/path/status/duration with
//! structured fields, and warns on slow requests. Health probes are excluded
//! to keep the log signal useful.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use tracing::{info, span, warn, Instrument, Level};
use uuid::Uuid;

/// Request id stored in request extensions, available to handlers.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
pub struct RequestLoggerConfig {
    pub service_name: String,
    pub exclude_paths: Vec<String>,
    pub slow_request_threshold_ms: u64,
}

impl Default for RequestLoggerConfig {
    fn default() -> Self {
        Self {
            service_name: "catalog-qa".to_string(),
            exclude_paths: vec!["/health".to_string()],
            slow_request_threshold_ms: 1000,
        }
    }
}

/// Request-logging middleware for actix-web.
#[derive(Clone)]
pub struct RequestLogger {
    config: RequestLoggerConfig,
}

impl RequestLogger {
    pub fn new(config: RequestLoggerConfig) -> Self {
        Self { config }
    }

    pub fn for_service(name: impl Into<String>) -> Self {
        Self::new(RequestLoggerConfig {
            service_name: name.into(),
            ..Default::default()
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
    config: RequestLoggerConfig,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let config = self.config.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let path = req.path().to_string();
            let method = req.method().to_string();

            if config.exclude_paths.iter().any(|p| path.starts_with(p)) {
                return service.call(req).await;
            }

            let request_id = Uuid::new_v4().to_string();
            req.extensions_mut().insert(RequestId(request_id.clone()));

            let request_span = span!(
                Level::INFO,
                "http_request",
                request_id = %request_id,
                method = %method,
                path = %path,
                service = %config.service_name,
            );

            let start = Instant::now();
            let result = service.call(req).instrument(request_span).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if duration_ms > config.slow_request_threshold_ms {
                        warn!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            status_code = status,
                            duration_ms,
                            "slow request"
                        );
                    } else {
                        info!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            status_code = status,
                            duration_ms,
                            "request completed"
                        );
                    }
                }
                Err(e) => {
                    warn!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        duration_ms,
                        "request failed: {}",
                        e
                    );
                }
            }

            result
        })
    }
}

/// Convenience constructor used at server wiring time.
pub fn request_logger(service_name: &str) -> RequestLogger {
    RequestLogger::for_service(service_name)
}
