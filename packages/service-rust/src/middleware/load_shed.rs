//! Load-shedding middleware for dispatches.
//!
//! Rejects dispatches when the concurrent count exceeds the layer's cap with
//! `DispatchError::Overloaded`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use switchboard_core::{Request, Response};
use tokio::sync::Semaphore;
use tower::{Layer, Service};

use crate::config::ServiceConfig;
use crate::route::DispatchError;

// ---------------------------------------------------------------------------
// LoadShedLayer
// ---------------------------------------------------------------------------

/// Tower layer that limits concurrent dispatches via a semaphore.
///
/// When all permits are taken, incoming dispatches are rejected immediately
/// with `DispatchError::Overloaded` rather than queued. Clones of the layer
/// (and of the services it produces) share one semaphore, so a single cap
/// covers every slot the layer is applied to.
#[derive(Debug, Clone)]
pub struct LoadShedLayer {
    semaphore: Arc<Semaphore>,
}

impl LoadShedLayer {
    /// Create a layer with the given concurrency cap.
    #[must_use]
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
        }
    }

    /// Create a layer using the config's concurrency cap.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.max_concurrent_dispatches)
    }
}

impl<S> Layer<S> for LoadShedLayer {
    type Service = LoadShedService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoadShedService {
            inner,
            semaphore: self.semaphore.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadShedService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces the concurrency cap.
#[derive(Debug, Clone)]
pub struct LoadShedService<S> {
    inner: S,
    semaphore: Arc<Semaphore>,
}

impl<S> Service<Request> for LoadShedService<S>
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
        // Acquire without waiting. If no permit is available, reject.
        let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
            return Box::pin(async { Err(DispatchError::Overloaded) });
        };

        let fut = self.inner.call(request);
        Box::pin(async move {
            // Hold the permit for the duration of the dispatch.
            let result = fut.await;
            drop(permit);
            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
