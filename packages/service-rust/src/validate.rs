//! Completeness validation: every declared operation must have a handler.

use std::collections::HashMap;

use switchboard_core::{OperationId, OperationRegistry};

use crate::route::RouteService;

// ---------------------------------------------------------------------------
// MissingOperationsError
// ---------------------------------------------------------------------------

/// Checked-build failure: one or more declared operations have no handler.
///
/// The missing list follows the registry's declaration order, not the order
/// registration calls were made in, so the diagnostic is reproducible across
/// runs. A build that fails this check constructs no service at all.
#[derive(Debug, thiserror::Error)]
#[error("service assembly incomplete; missing handlers for: {}", join_names(.missing))]
pub struct MissingOperationsError {
    missing: Vec<OperationId>,
}

impl MissingOperationsError {
    /// The unregistered operations, in registry declaration order.
    #[must_use]
    pub fn missing(&self) -> &[OperationId] {
        &self.missing
    }
}

fn join_names(missing: &[OperationId]) -> String {
    missing
        .iter()
        .map(OperationId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// check_completeness
// ---------------------------------------------------------------------------

/// Validate the slot map against the registry.
///
/// Set difference of the registry against registered slots. No partial
/// credit: a single missing operation fails the whole check.
///
/// # Errors
///
/// Returns [`MissingOperationsError`] listing every operation without a
/// handler, ordered by the registry's declaration order.
pub fn check_completeness(
    registry: &OperationRegistry,
    slots: &HashMap<OperationId, RouteService>,
) -> Result<(), MissingOperationsError> {
    let missing: Vec<OperationId> = registry
        .iter()
        .filter(|operation| !slots.contains_key(operation))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingOperationsError { missing })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use switchboard_core::{Request, Response};

    use super::*;
    use crate::route::handler_fn;

    fn stub_route() -> RouteService {
        RouteService::new(handler_fn(|_req: Request| async move {
            Ok(Response::empty())
        }))
    }

    fn slots_for(names: &[&str]) -> HashMap<OperationId, RouteService> {
        names
            .iter()
            .map(|name| (OperationId::new(*name), stub_route()))
            .collect()
    }

    #[test]
    fn complete_slots_pass() {
        let registry = OperationRegistry::from_operations(["Get", "Put"]);
        let slots = slots_for(&["Put", "Get"]);
        assert!(check_completeness(&registry, &slots).is_ok());
    }

    #[test]
    fn missing_operations_reported_in_registry_order() {
        let registry = OperationRegistry::from_operations(["Delete", "Get", "Put", "Scan"]);
        // Register out of registry order; the diagnostic must not care.
        let slots = slots_for(&["Get"]);

        let err = check_completeness(&registry, &slots).unwrap_err();
        let missing: Vec<&str> = err.missing().iter().map(OperationId::as_str).collect();
        assert_eq!(missing, vec!["Delete", "Put", "Scan"]);
    }

    #[test]
    fn single_missing_operation_fails_the_whole_check() {
        let registry = OperationRegistry::from_operations(["Get", "Put"]);
        let slots = slots_for(&["Get"]);

        let err = check_completeness(&registry, &slots).unwrap_err();
        assert_eq!(err.missing().len(), 1);
        assert_eq!(err.missing()[0].as_str(), "Put");
    }

    #[test]
    fn error_message_lists_every_missing_operation() {
        let registry = OperationRegistry::from_operations(["Get", "Put"]);
        let err = check_completeness(&registry, &HashMap::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "service assembly incomplete; missing handlers for: Get, Put"
        );
    }

    #[test]
    fn empty_registry_is_trivially_complete() {
        let registry = OperationRegistry::from_operations(Vec::<String>::new());
        assert!(check_completeness(&registry, &HashMap::new()).is_ok());
    }

    #[test]
    fn extra_slots_outside_registry_do_not_mask_missing_ones() {
        let registry = OperationRegistry::from_operations(["Get", "Put"]);
        // The builder rejects these at registration; the validator still
        // only counts registry membership.
        let slots = slots_for(&["Get", "Scan"]);

        let err = check_completeness(&registry, &slots).unwrap_err();
        assert_eq!(err.missing()[0].as_str(), "Put");
    }

    proptest! {
        /// For any registry and any registered subset, the missing list is
        /// exactly the set difference, in registry declaration order.
        #[test]
        fn missing_is_ordered_set_difference(
            names in proptest::collection::btree_set("[a-z]{1,8}", 0..12),
            mask in proptest::collection::vec(any::<bool>(), 12),
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let registry = OperationRegistry::from_operations(names.clone());

            let registered: Vec<&str> = names
                .iter()
                .zip(mask.iter())
                .filter_map(|(name, keep)| keep.then_some(name.as_str()))
                .collect();
            let slots = slots_for(&registered);

            let expected: Vec<String> = names
                .iter()
                .zip(mask.iter())
                .filter_map(|(name, keep)| (!keep).then_some(name.clone()))
                .collect();

            match check_completeness(&registry, &slots) {
                Ok(()) => prop_assert!(expected.is_empty()),
                Err(err) => {
                    let got: Vec<String> = err
                        .missing()
                        .iter()
                        .map(|op| op.as_str().to_string())
                        .collect();
                    prop_assert_eq!(got, expected);
                }
            }
        }
    }
}
