//! The operation registry: the fixed set of operations a service must support.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::operation::OperationId;

// ---------------------------------------------------------------------------
// OperationRegistry
// ---------------------------------------------------------------------------

/// Immutable, ordered set of [`OperationId`]s derived from the service model.
///
/// The registry is fixed for the lifetime of a service definition: it
/// preserves the model's declaration order, rejects duplicates, and exposes
/// no mutation API. It is the ground truth the completeness validator checks
/// registered handlers against, and its order drives diagnostic ordering so
/// error messages are reproducible across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<OperationId>", into = "Vec<OperationId>")]
pub struct OperationRegistry {
    /// Declaration order from the model.
    order: Vec<OperationId>,
    /// Membership index: operation -> position in `order`.
    index: HashMap<OperationId, usize>,
}

impl OperationRegistry {
    /// Build a registry from the model's operation names, preserving
    /// declaration order.
    ///
    /// Duplicate names are kept once at their first position; a duplicate in
    /// a model listing is an anomaly worth surfacing, so it is logged.
    pub fn from_operations<I, T>(operations: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OperationId>,
    {
        let mut order = Vec::new();
        let mut index = HashMap::new();
        for operation in operations {
            let operation: OperationId = operation.into();
            if index.contains_key(&operation) {
                tracing::warn!(%operation, "duplicate operation in model listing, ignoring");
                continue;
            }
            index.insert(operation.clone(), order.len());
            order.push(operation);
        }
        Self { order, index }
    }

    /// Whether `operation` is part of the service definition.
    #[must_use]
    pub fn contains(&self, operation: &OperationId) -> bool {
        self.index.contains_key(operation)
    }

    /// Position of `operation` in the model's declaration order.
    #[must_use]
    pub fn position(&self, operation: &OperationId) -> Option<usize> {
        self.index.get(operation).copied()
    }

    /// Iterate over all operations in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, OperationId> {
        self.order.iter()
    }

    /// Number of declared operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the service declares no operations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The declared operations as an ordered slice.
    #[must_use]
    pub fn as_slice(&self) -> &[OperationId] {
        &self.order
    }
}

impl<'a> IntoIterator for &'a OperationRegistry {
    type Item = &'a OperationId;
    type IntoIter = std::slice::Iter<'a, OperationId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<OperationId>> for OperationRegistry {
    fn from(operations: Vec<OperationId>) -> Self {
        Self::from_operations(operations)
    }
}

impl From<OperationRegistry> for Vec<OperationId> {
    fn from(registry: OperationRegistry) -> Self {
        registry.order
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_declaration_order() {
        let registry = OperationRegistry::from_operations(["Put", "Get", "Delete"]);
        let names: Vec<&str> = registry.iter().map(OperationId::as_str).collect();
        assert_eq!(names, vec!["Put", "Get", "Delete"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn membership_and_position() {
        let registry = OperationRegistry::from_operations(["Get", "Put"]);
        assert!(registry.contains(&OperationId::new("Get")));
        assert!(!registry.contains(&OperationId::new("Scan")));
        assert_eq!(registry.position(&OperationId::new("Put")), Some(1));
        assert_eq!(registry.position(&OperationId::new("Scan")), None);
    }

    #[test]
    fn duplicates_keep_first_position() {
        let registry = OperationRegistry::from_operations(["Get", "Put", "Get"]);
        let names: Vec<&str> = registry.iter().map(OperationId::as_str).collect();
        assert_eq!(names, vec!["Get", "Put"]);
        assert_eq!(registry.position(&OperationId::new("Get")), Some(0));
    }

    #[test]
    fn empty_registry() {
        let registry = OperationRegistry::from_operations(Vec::<String>::new());
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn serde_round_trip_preserves_order() {
        let registry = OperationRegistry::from_operations(["Put", "Get"]);
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, "[\"Put\",\"Get\"]");
        let back: OperationRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
    }
}
