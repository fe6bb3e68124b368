// src/server/handler.rs
use crate::health::HealthAggregator;
use crate::metrics::MetricsRegistry;
use hyper::{header, Body, Method, Request, Response, StatusCode};
use std::sync::Arc;
use tokio::time::Instant;
use tower::Service;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub const HEALTH_PATH: &str = "/health";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("failed to gather metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Serves `GET /health`.
#[derive(Clone)]
pub struct HealthHandler {
    aggregator: Arc<HealthAggregator>,
}

impl HealthHandler {
    pub fn new(aggregator: Arc<HealthAggregator>) -> Self {
        Self { aggregator }
    }

    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, HandlerError> {
        if req.uri().path() != HEALTH_PATH {
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }
        if req.method() != Method::GET {
            return Ok(Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header(header::ALLOW, "GET")
                .body(Body::from("Method Not Allowed"))?);
        }

        info!("Checking system health");

        let deadline = Instant::now() + self.aggregator.prober().ceiling();
        let report = self.aggregator.build_report(deadline).await;
        let body = serde_json::to_vec(&report)?;

        info!(status = %report.status(), "Health report served");

        // Degraded is still a successful answer; the status lives in the body.
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CACHE_CONTROL, "no-store")
            .body(Body::from(body))?)
    }
}

impl Service<Request<Body>> for HealthHandler {
    type Response = Response<Body>;
    type Error = BoxError;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        let span = info_span!(
            "request",
            component = "health_api",
            request_id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(
            async move {
                handler.handle(req).await.map_err(|e| {
                    tracing::error!(%e, "health handler error");
                    Box::new(e) as BoxError
                })
            }
            .instrument(span),
        )
    }
}

/// Serves the Prometheus text exposition at a fixed path.
#[derive(Clone)]
pub struct MetricsHandler {
    registry: Arc<MetricsRegistry>,
    path: Arc<str>,
}

impl MetricsHandler {
    pub fn new(registry: Arc<MetricsRegistry>, path: impl Into<Arc<str>>) -> Self {
        Self {
            registry,
            path: path.into(),
        }
    }

    pub fn handle(&self, req: &Request<Body>) -> Result<Response<Body>, HandlerError> {
        if req.uri().path() != self.path.as_ref() {
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }

        let metrics = self.registry.gather()?;
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(metrics))?)
    }
}

impl Service<Request<Body>> for MetricsHandler {
    type Response = Response<Body>;
    type Error = BoxError;
    type Future = futures::future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        futures::future::ready(self.handle(&req).map_err(|e| {
            tracing::error!(%e, "metrics handler error");
            Box::new(e) as BoxError
        }))
    }
}

fn plain(status: StatusCode, message: &'static str) -> Result<Response<Body>, HandlerError> {
    Ok(Response::builder().status(status).body(Body::from(message))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{Dependency, DependencyError, Prober};
    use crate::registry::DependencyRegistry;
    use async_trait::async_trait;
    use tower::ServiceExt;

    struct Down;

    #[async_trait]
    impl Dependency for Down {
        async fn health_check(&self) -> Result<(), DependencyError> {
            Err(DependencyError::Connection("refused".to_string()))
        }

        async fn close(&self) -> Result<(), DependencyError> {
            Ok(())
        }
    }

    fn handler(registry: DependencyRegistry) -> HealthHandler {
        let aggregator = HealthAggregator::new(Arc::new(registry), Prober::default());
        HealthHandler::new(Arc::new(aggregator))
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_registry_reports_ok() {
        let request = Request::get(HEALTH_PATH).body(Body::empty()).unwrap();
        let response = handler(DependencyRegistry::new()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["description"], "System is running and healthy");
        assert!(json["dependencies"].as_object().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_report_is_still_200() {
        let registry = DependencyRegistry::new();
        registry.register("redis", Arc::new(Down));

        let request = Request::get(HEALTH_PATH).body(Body::empty()).unwrap();
        let response = handler(registry).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["dependencies"]["redis"]["status"], "unhealthy");
        assert_eq!(
            json["dependencies"]["redis"]["error"],
            "connection failed: refused"
        );
    }

    #[tokio::test]
    async fn rejects_other_methods_and_paths() {
        let post = Request::post(HEALTH_PATH).body(Body::empty()).unwrap();
        let response = handler(DependencyRegistry::new()).oneshot(post).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");

        let other = Request::get("/orders").body(Body::empty()).unwrap();
        let response = handler(DependencyRegistry::new()).oneshot(other).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_handler_serves_configured_path() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        registry.collector().record_ticker_cycle();
        let handler = MetricsHandler::new(registry, "/metrics");

        let request = Request::get("/metrics").body(Body::empty()).unwrap();
        let response = handler.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&text).contains("health_ticker_cycles_total 1"));

        let request = Request::get("/health").body(Body::empty()).unwrap();
        let response = handler.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
