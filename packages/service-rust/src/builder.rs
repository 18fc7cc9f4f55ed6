//! The service builder: collects one handler per operation, then assembles.

use std::collections::HashMap;

use switchboard_core::{OperationId, OperationRegistry, Request, Response};
use tower::{Layer, Service};

use crate::config::ServiceConfig;
use crate::route::{BoxedLayer, DispatchError, RouteService};
use crate::service::AssembledService;
use crate::validate::{self, MissingOperationsError};

// ---------------------------------------------------------------------------
// ServiceBuilder
// ---------------------------------------------------------------------------

/// Accumulates handler registrations against a fixed [`OperationRegistry`]
/// and produces an [`AssembledService`] through one of two terminal calls.
///
/// The builder is single-owner and single-threaded by contract: registration
/// methods consume and return `self`, and both terminal calls consume the
/// builder outright, so use-after-build is a compile error.
///
/// - [`build`](Self::build) runs the completeness validator and refuses to
///   construct a service while any declared operation lacks a handler. This
///   is the recommended production path.
/// - [`build_unchecked`](Self::build_unchecked) skips validation; any
///   operation left unregistered becomes a
///   [`DispatchError::UnregisteredOperation`] the first time it is invoked.
///   Use it only where completeness is guaranteed elsewhere (test
///   scaffolding, call sites proven complete by generation).
pub struct ServiceBuilder {
    registry: OperationRegistry,
    config: ServiceConfig,
    slots: HashMap<OperationId, RouteService>,
}

impl ServiceBuilder {
    /// Start assembling a service for the given operation registry and
    /// frozen configuration.
    #[must_use]
    pub fn new(registry: OperationRegistry, config: ServiceConfig) -> Self {
        let slots = HashMap::with_capacity(registry.len());
        Self {
            registry,
            config,
            slots,
        }
    }

    /// Register the handler for one operation.
    ///
    /// Re-registering an operation replaces the previous handler: last write
    /// wins.
    ///
    /// # Panics
    ///
    /// Panics if `operation` is not part of the operation registry. That is
    /// a programmer/model mismatch, and it surfaces at the registration call
    /// site rather than being deferred.
    #[must_use]
    #[track_caller]
    pub fn register_handler<S>(self, operation: impl Into<OperationId>, handler: S) -> Self
    where
        S: Service<Request, Response = Response, Error = DispatchError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        self.register_route(operation.into(), RouteService::new(handler))
    }

    /// Register a handler wrapped in a stack of middleware layers.
    ///
    /// Layers apply innermost-to-outermost: the first layer in `layers` sits
    /// closest to the handler, the last one sees the request first. Last
    /// write wins on re-registration, same as
    /// [`register_handler`](Self::register_handler).
    ///
    /// # Panics
    ///
    /// Panics if `operation` is not part of the operation registry.
    #[must_use]
    #[track_caller]
    pub fn register_handler_with_layers<S>(
        self,
        operation: impl Into<OperationId>,
        handler: S,
        layers: Vec<BoxedLayer>,
    ) -> Self
    where
        S: Service<Request, Response = Response, Error = DispatchError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let mut route = RouteService::new(handler);
        for layer in &layers {
            route = layer.layer(route);
        }
        self.register_route(operation.into(), route)
    }

    /// Apply a bulk registration pack (e.g. a generated call site that
    /// installs a whole handler family at once).
    #[must_use]
    pub fn install<P: HandlerPack>(self, pack: P) -> Self {
        pack.install(self)
    }

    #[track_caller]
    fn register_route(mut self, operation: OperationId, route: RouteService) -> Self {
        assert!(
            self.registry.contains(&operation),
            "operation `{operation}` is not declared by the service model; declared operations: [{}]",
            self.registry
                .iter()
                .map(OperationId::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        if self.slots.insert(operation.clone(), route).is_some() {
            tracing::debug!(%operation, "handler re-registered; previous handler replaced");
        }
        self
    }

    /// Checked assembly: validate completeness, then freeze the slot map.
    ///
    /// Never constructs a partial service; either every declared operation
    /// has a handler and a service is returned, or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`MissingOperationsError`] listing every operation without a
    /// handler, in registry declaration order.
    pub fn build(self) -> Result<AssembledService, MissingOperationsError> {
        validate::check_completeness(&self.registry, &self.slots)?;
        Ok(AssembledService::from_parts(
            self.registry,
            self.config,
            self.slots,
        ))
    }

    /// Unchecked assembly: freeze whatever is registered, skipping the
    /// completeness validator.
    ///
    /// Dispatching an operation that was never registered fails with
    /// [`DispatchError::UnregisteredOperation`] at runtime. This trades the
    /// checked path's front-loaded, exhaustive diagnostics for lazy per-route
    /// failure; the caller accepts responsibility for completeness.
    #[must_use]
    pub fn build_unchecked(self) -> AssembledService {
        if self.slots.len() < self.registry.len() {
            tracing::debug!(
                registered = self.slots.len(),
                declared = self.registry.len(),
                "unchecked build with unregistered operations; they will fail at dispatch"
            );
        }
        AssembledService::from_parts(self.registry, self.config, self.slots)
    }
}

impl std::fmt::Debug for ServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("registry", &self.registry)
            .field("registered", &self.slots.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// HandlerPack
// ---------------------------------------------------------------------------

/// Bulk configuration: a value that registers several handlers in one step.
///
/// Lets generated or library code hand a whole handler family to the builder
/// without the application enumerating each operation.
pub trait HandlerPack {
    /// Register this pack's handlers and return the builder.
    fn install(self, builder: ServiceBuilder) -> ServiceBuilder;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
