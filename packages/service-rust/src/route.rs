//! Type-erased handler routes and per-operation middleware plumbing.
//!
//! A [`RouteService`] is what a handler slot holds once a handler (plus any
//! middleware layers) is registered: a clone-cheap, type-erased handle around
//! a concrete `tower::Service`. Each dispatch clones the inner service and
//! drives it to completion, so a frozen slot map can serve concurrent
//! dispatches from `&self` without locking.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use switchboard_core::{OperationId, Request, Response};
use tower::{Layer, Service, ServiceExt};

/// Boxed future returned by type-erased routes and the dispatch surface.
pub type BoxedFuture = Pin<Box<dyn Future<Output = Result<Response, DispatchError>> + Send>>;

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Errors surfaced from dispatching a request through an assembled service.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler slot exists for the requested operation. Only reachable
    /// when the service was built with `build_unchecked`, or when the wire
    /// carried an operation name outside the service definition.
    #[error("no handler registered for operation: {operation}")]
    UnregisteredOperation {
        /// The operation the request targeted.
        operation: OperationId,
    },
    /// The dispatch exceeded its deadline (timeout middleware).
    #[error("dispatch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// The service hit its concurrency cap (load-shed middleware).
    #[error("service overloaded, try again later")]
    Overloaded,
    /// The handler itself failed.
    #[error("handler error: {0}")]
    Handler(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// RouteService
// ---------------------------------------------------------------------------

/// Object-safe view of a handler: call from `&self`, future is owned.
trait DynHandler: Send + Sync {
    fn call_handler(&self, request: Request) -> BoxedFuture;
}

/// Adapter that type-erases a concrete `Service` into a [`DynHandler`].
struct HandlerAdapter<S>(S);

impl<S> DynHandler for HandlerAdapter<S>
where
    S: Service<Request, Response = Response, Error = DispatchError> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    fn call_handler(&self, request: Request) -> BoxedFuture {
        // Clone per call: readiness and any per-call state live in the
        // clone, so this handle never needs `&mut self`.
        Box::pin(self.0.clone().oneshot(request))
    }
}

/// The type-erased, clone-cheap handler handle held by one slot.
///
/// Wraps any `tower::Service<Request, Response = Response, Error =
/// DispatchError>` that is `Clone + Send + Sync`. Middleware layers wrap a
/// `RouteService` and produce another `RouteService`, so arbitrarily deep
/// stacks stay behind one concrete type.
#[derive(Clone)]
pub struct RouteService {
    inner: Arc<dyn DynHandler>,
}

impl RouteService {
    /// Erase a concrete service into a route.
    pub fn new<S>(service: S) -> Self
    where
        S: Service<Request, Response = Response, Error = DispatchError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        Self {
            inner: Arc::new(HandlerAdapter(service)),
        }
    }

    /// Dispatch a request through this route from a shared reference.
    pub(crate) fn dispatch(&self, request: Request) -> BoxedFuture {
        self.inner.call_handler(request)
    }
}

impl Service<Request> for RouteService {
    type Response = Response;
    type Error = DispatchError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness is handled per call on the cloned inner service.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.inner.call_handler(request)
    }
}

impl fmt::Debug for RouteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteService").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// handler_fn
// ---------------------------------------------------------------------------

/// Wrap an async closure as a registrable handler service.
///
/// The closure runs once per dispatch; captured state must be `Clone`.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, DispatchError>> + Send + 'static,
{
    HandlerFn { f }
}

/// Service adapter returned by [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> Service<Request> for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, DispatchError>> + Send + 'static,
{
    type Response = Response;
    type Error = DispatchError;
    type Future = Fut;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        (self.f)(request)
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// BoxedLayer
// ---------------------------------------------------------------------------

/// A type-erased middleware layer over routes.
///
/// Produced by [`boxed_layer`]; a slot's layer stack is a
/// `Vec<BoxedLayer>` applied innermost-to-outermost around the handler.
pub type BoxedLayer = Box<dyn Layer<RouteService, Service = RouteService> + Send + Sync>;

/// Adapter that re-erases a layer's output service back into a route.
struct LayerAdapter<L>(L);

impl<L> Layer<RouteService> for LayerAdapter<L>
where
    L: Layer<RouteService>,
    L::Service:
        Service<Request, Response = Response, Error = DispatchError> + Clone + Send + Sync + 'static,
    <L::Service as Service<Request>>::Future: Send + 'static,
{
    type Service = RouteService;

    fn layer(&self, inner: RouteService) -> Self::Service {
        RouteService::new(self.0.layer(inner))
    }
}

/// Type-erase any compatible `tower::Layer` for use in a slot's layer stack.
pub fn boxed_layer<L>(layer: L) -> BoxedLayer
where
    L: Layer<RouteService> + Send + Sync + 'static,
    L::Service:
        Service<Request, Response = Response, Error = DispatchError> + Clone + Send + Sync + 'static,
    <L::Service as Service<Request>>::Future: Send + 'static,
{
    Box::new(LayerAdapter(layer))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use switchboard_core::Response;

    use super::*;

    #[tokio::test]
    async fn route_dispatches_closure_handler() {
        let route = RouteService::new(handler_fn(|req: Request| async move {
            Ok(Response::new(req.into_body()))
        }));

        let resp = route.dispatch(Request::new("Echo", &b"hello"[..])).await.unwrap();
        assert_eq!(resp.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn route_is_usable_concurrently_from_shared_clones() {
        let route = RouteService::new(handler_fn(|req: Request| async move {
            Ok(Response::new(req.into_body()))
        }));

        let a = route.clone();
        let b = route;
        let (ra, rb) = tokio::join!(
            a.dispatch(Request::new("Echo", &b"a"[..])),
            b.dispatch(Request::new("Echo", &b"b"[..])),
        );
        assert_eq!(ra.unwrap().body().as_ref(), b"a");
        assert_eq!(rb.unwrap().body().as_ref(), b"b");
    }

    #[tokio::test]
    async fn boxed_layer_wraps_route() {
        /// Layer that tags responses by appending a suffix to the body.
        struct SuffixLayer(&'static [u8]);

        #[derive(Clone)]
        struct SuffixService {
            inner: RouteService,
            suffix: &'static [u8],
        }

        impl Layer<RouteService> for SuffixLayer {
            type Service = SuffixService;

            fn layer(&self, inner: RouteService) -> Self::Service {
                SuffixService {
                    inner,
                    suffix: self.0,
                }
            }
        }

        impl Service<Request> for SuffixService {
            type Response = Response;
            type Error = DispatchError;
            type Future = BoxedFuture;

            fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
                Poll::Ready(Ok(()))
            }

            fn call(&mut self, request: Request) -> Self::Future {
                let fut = self.inner.dispatch(request);
                let suffix = self.suffix;
                Box::pin(async move {
                    let resp = fut.await?;
                    let mut body = resp.into_body().to_vec();
                    body.extend_from_slice(suffix);
                    Ok(Response::new(body))
                })
            }
        }

        let layer = boxed_layer(SuffixLayer(b"!"));
        let route = layer.layer(RouteService::new(handler_fn(|req: Request| async move {
            Ok(Response::new(req.into_body()))
        })));

        let resp = route.dispatch(Request::new("Echo", &b"hi"[..])).await.unwrap();
        assert_eq!(resp.body().as_ref(), b"hi!");
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        let route = RouteService::new(handler_fn(|_req: Request| async move {
            Err(DispatchError::Handler(anyhow::anyhow!("backend down")))
        }));

        let err = route.dispatch(Request::new("Get", &b""[..])).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        assert!(err.to_string().contains("backend down"));
    }
}
