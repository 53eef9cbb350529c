//! Access log middleware
//!
//! Logs method, path, status and latency of every request through `tracing`.

use axum::{body::Body, http::Request, response::Response};
use futures::future::BoxFuture;
use std::{
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{info, warn};

/// Layer for HTTP access logging
#[derive(Clone, Copy, Default)]
pub struct AccessLogLayer;

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogMiddleware { inner }
    }
}

/// Middleware service for HTTP access logging
#[derive(Clone)]
pub struct AccessLogMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for AccessLogMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        // The clone may not be ready; swap so the ready one handles this request
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let method = request.method().to_string();
            let path = request.uri().path().to_string();
            let started = Instant::now();

            let response = inner.call(request).await?;

            let status = response.status();
            let elapsed_ms = started.elapsed().as_millis() as u64;
            if status.is_server_error() {
                warn!(%method, %path, status = status.as_u16(), elapsed_ms, "HTTP request failed");
            } else {
                info!(%method, %path, status = status.as_u16(), elapsed_ms, "HTTP request");
            }

            Ok(response)
        })
    }
}
