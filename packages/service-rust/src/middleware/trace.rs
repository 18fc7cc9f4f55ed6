//! Tracing middleware for dispatches.
//!
//! Records dispatch duration and outcome in `tracing` spans keyed by the
//! operation name. Structured logging only; no metrics exporter.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use switchboard_core::{Request, Response};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::route::DispatchError;

// ---------------------------------------------------------------------------
// TraceLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments dispatches with timing and outcome spans.
#[derive(Debug, Clone)]
pub struct TraceLayer;

impl<S> Layer<S> for TraceLayer {
    type Service = TraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceService { inner }
    }
}

// ---------------------------------------------------------------------------
// TraceService
// ---------------------------------------------------------------------------

/// Service wrapper that records dispatch duration and outcome.
#[derive(Debug, Clone)]
pub struct TraceService<S> {
    inner: S,
}

impl<S> Service<Request> for TraceService<S>
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
        let operation = request.operation().clone();

        let span = info_span!(
            "dispatch",
            operation = %operation,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let duration_ms =
                    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(_) => "error",
                };

                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                tracing::info!(
                    operation = %operation,
                    duration_ms,
                    outcome,
                    "dispatch complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
