//! Timeout middleware for dispatches.
//!
//! Fails dispatches that exceed the layer's deadline with
//! `DispatchError::Timeout`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use switchboard_core::{Request, Response};
use tower::{Layer, Service};

use crate::config::ServiceConfig;
use crate::route::DispatchError;

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps a handler with a fixed per-dispatch deadline.
#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    /// Create a layer enforcing the given deadline.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create a layer using the config's default dispatch timeout.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(Duration::from_millis(config.default_timeout_ms))
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces the deadline around the inner handler.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    timeout: Duration,
}

impl<S> Service<Request> for TimeoutService<S>
where
    S: Service<Request, Response = Response, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<Response, DispatchError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let timeout = self.timeout;
        let fut = self.inner.call(request);
        Box::pin(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                    Err(DispatchError::Timeout { timeout_ms })
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
