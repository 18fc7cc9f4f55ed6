//! Operation identifiers and the uniform dispatch envelope.
//!
//! An [`OperationId`] names one independently invokable unit of a service's
//! contract. [`Request`] and [`Response`] are the opaque envelopes that
//! handlers consume and produce; the serialization layer that fills the
//! `body` bytes lives outside this crate.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::Extensions;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OperationId
// ---------------------------------------------------------------------------

/// Opaque, stable identifier for one operation declared by the service model.
///
/// Cheap to clone (`Arc<str>` internally) and usable as a map key. Identity
/// is the operation name exactly as the model declares it; no normalization
/// is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Arc<str>);

impl OperationId {
    /// Create an identifier from an operation name.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// The operation name as declared by the model.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OperationId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One dispatchable request: the target operation, an opaque payload, and a
/// typed extension map.
///
/// The operation travels inside the envelope so a single `dispatch(request)`
/// entry point can route it. Extensions carry per-request state injected by
/// the assembly layer (e.g. the service context) or by middleware.
#[derive(Debug)]
pub struct Request {
    operation: OperationId,
    body: Bytes,
    extensions: Extensions,
}

impl Request {
    /// Create a request targeting `operation` with the given payload.
    #[must_use]
    pub fn new(operation: impl Into<OperationId>, body: impl Into<Bytes>) -> Self {
        Self {
            operation: operation.into(),
            body: body.into(),
            extensions: Extensions::new(),
        }
    }

    /// The operation this request targets.
    #[must_use]
    pub fn operation(&self) -> &OperationId {
        &self.operation
    }

    /// The opaque request payload.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the request, returning the payload.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Read-only view of the request extensions.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable view of the request extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A handler's result: an opaque payload plus a typed extension map for
/// metadata that middleware may attach on the way out.
#[derive(Debug, Default)]
pub struct Response {
    body: Bytes,
    extensions: Extensions,
}

impl Response {
    /// Create a response carrying the given payload.
    #[must_use]
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            extensions: Extensions::new(),
        }
    }

    /// Create a response with an empty payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The opaque response payload.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response, returning the payload.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Read-only view of the response extensions.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable view of the response extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_id_equality_is_by_name() {
        let a = OperationId::new("GetItem");
        let b = OperationId::from("GetItem");
        let c = OperationId::from("PutItem".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "GetItem");
        assert_eq!(a.to_string(), "GetItem");
    }

    #[test]
    fn operation_id_serde_round_trip() {
        let id = OperationId::new("GetItem");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"GetItem\"");
        let back: OperationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn request_carries_operation_and_body() {
        let req = Request::new("GetItem", &b"payload"[..]);
        assert_eq!(req.operation().as_str(), "GetItem");
        assert_eq!(req.body().as_ref(), b"payload");
        assert_eq!(req.into_body().as_ref(), b"payload");
    }

    #[test]
    fn request_extensions_hold_typed_state() {
        #[derive(Debug, Clone, PartialEq)]
        struct TenantId(&'static str);

        let mut req = Request::new("GetItem", Bytes::new());
        req.extensions_mut().insert(TenantId("acme"));
        assert_eq!(req.extensions().get::<TenantId>(), Some(&TenantId("acme")));
    }

    #[test]
    fn empty_response_has_no_payload() {
        let resp = Response::empty();
        assert!(resp.body().is_empty());
    }
}
