//! The assembled, dispatchable service and its type-erased boxed form.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use switchboard_core::{OperationId, OperationRegistry, Request, Response};
use tower::Service;

use crate::config::{ServiceConfig, ServiceContext};
use crate::route::{BoxedFuture, DispatchError, RouteService};

// ---------------------------------------------------------------------------
// AssembledService
// ---------------------------------------------------------------------------

/// A fully assembled service: one frozen slot per registered operation.
///
/// Immutable once constructed; no slot can be added or removed. Cloning is
/// cheap (the slot map sits behind an `Arc`), and [`dispatch`](Self::dispatch)
/// takes `&self`, so a single instance serves unrestricted concurrent
/// dispatches with no internal locking.
///
/// Also implements `tower::Service<Request>` so transports can compose it
/// into tower stacks without knowing its concrete handler types.
#[derive(Clone)]
pub struct AssembledService {
    inner: Arc<Inner>,
}

struct Inner {
    registry: OperationRegistry,
    context: ServiceContext,
    slots: HashMap<OperationId, RouteService>,
}

impl AssembledService {
    pub(crate) fn from_parts(
        registry: OperationRegistry,
        config: ServiceConfig,
        slots: HashMap<OperationId, RouteService>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                context: ServiceContext {
                    config: Arc::new(config),
                },
                slots,
            }),
        }
    }

    /// The operation registry this service was assembled against.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.inner.registry
    }

    /// The frozen cross-cutting configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<ServiceConfig> {
        &self.inner.context.config
    }

    /// Route a request to its operation's handler through that slot's
    /// middleware stack.
    ///
    /// The service context is inserted into the request extensions before
    /// routing, so every handler invocation can read the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnregisteredOperation`] when no slot exists
    /// for the request's operation (only reachable after an unchecked build,
    /// or for an operation name outside the service definition). Handler and
    /// middleware failures propagate as their respective variants.
    pub async fn dispatch(&self, mut request: Request) -> Result<Response, DispatchError> {
        request.extensions_mut().insert(self.inner.context.clone());
        match self.inner.slots.get(request.operation()) {
            Some(route) => route.dispatch(request).await,
            None => {
                let operation = request.operation().clone();
                tracing::warn!(%operation, "dispatch to unregistered operation");
                Err(DispatchError::UnregisteredOperation { operation })
            }
        }
    }

    /// Erase this service behind the uniform dispatch interface.
    ///
    /// Consumes the typed handle; the returned [`BoxedService`] is the single
    /// integration point the transport layer holds, and its dispatch behavior
    /// is identical to this service's.
    #[must_use]
    pub fn boxed(self) -> BoxedService {
        BoxedService {
            inner: Box::new(self),
        }
    }
}

impl Service<Request> for AssembledService {
    type Response = Response;
    type Error = DispatchError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { service.dispatch(request).await })
    }
}

impl fmt::Debug for AssembledService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledService")
            .field("registry", &self.inner.registry)
            .field("registered", &self.inner.slots.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// BoxedService (type-erased dispatch capability)
// ---------------------------------------------------------------------------

/// Object-safe dispatch capability implemented by assembled services.
trait DynDispatch: Send + Sync {
    fn dispatch_owned(&self, request: Request) -> BoxedFuture;
    fn registry(&self) -> &OperationRegistry;
}

impl DynDispatch for AssembledService {
    fn dispatch_owned(&self, request: Request) -> BoxedFuture {
        let service = self.clone();
        Box::pin(async move { service.dispatch(request).await })
    }

    fn registry(&self) -> &OperationRegistry {
        AssembledService::registry(self)
    }
}

/// Type-erased service handle: dispatch capability only.
///
/// Wraps an owned [`AssembledService`] behind a uniform interface so it can
/// be stored or passed across abstraction boundaries without the holder
/// knowing the concrete handler and middleware composition. Boxing is a
/// one-time ownership transfer and preserves dispatch behavior exactly.
pub struct BoxedService {
    inner: Box<dyn DynDispatch>,
}

impl BoxedService {
    /// Route a request exactly as the underlying service would.
    ///
    /// # Errors
    ///
    /// Same contract as [`AssembledService::dispatch`].
    pub async fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        self.inner.dispatch_owned(request).await
    }

    /// The operation registry of the underlying service.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        self.inner.registry()
    }
}

impl Service<Request> for BoxedService {
    type Response = Response;
    type Error = DispatchError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.inner.dispatch_owned(request)
    }
}

impl From<AssembledService> for BoxedService {
    fn from(service: AssembledService) -> Self {
        service.boxed()
    }
}

impl fmt::Debug for BoxedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedService")
            .field("registry", self.inner.registry())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
