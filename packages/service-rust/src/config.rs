//! Cross-cutting service configuration, built once and frozen before assembly.

use std::sync::Arc;

use http::Extensions;

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Cross-cutting settings consumed by the service builder and readable from
/// every handler invocation.
///
/// Immutable after [`ServiceConfigBuilder::build`]; the assembly layer shares
/// it behind an `Arc` and injects it into each request via
/// [`ServiceContext`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Default deadline for a single dispatch in milliseconds. Consumed by
    /// the timeout middleware; the core imposes no deadline itself.
    pub default_timeout_ms: u64,
    /// Concurrency cap consumed by the load-shed middleware.
    pub max_concurrent_dispatches: u32,
    /// Typed shared state (e.g. database pools, feature toggles) that
    /// handlers and middleware may read.
    pub extensions: Extensions,
}

impl ServiceConfig {
    /// Start building a config.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            max_concurrent_dispatches: 1000,
            extensions: Extensions::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServiceConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for [`ServiceConfig`]. Setters consume and return the builder so
/// configuration reads as a single chained expression.
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Set the default per-dispatch deadline in milliseconds.
    #[must_use]
    pub fn default_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.default_timeout_ms = timeout_ms;
        self
    }

    /// Set the concurrency cap for the load-shed middleware.
    #[must_use]
    pub fn max_concurrent_dispatches(mut self, max: u32) -> Self {
        self.config.max_concurrent_dispatches = max;
        self
    }

    /// Insert a typed value into the shared extension map. One value per
    /// type; inserting the same type twice keeps the last value.
    #[must_use]
    pub fn extension<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.config.extensions.insert(value);
        self
    }

    /// Freeze the configuration.
    #[must_use]
    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

// ---------------------------------------------------------------------------
// ServiceContext
// ---------------------------------------------------------------------------

/// Per-dispatch view of the frozen configuration.
///
/// The assembled service inserts a `ServiceContext` into every request's
/// extensions before routing, so handlers and middleware can read the
/// cross-cutting settings without ambient globals.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub config: Arc<ServiceConfig>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServiceConfig::default();
        assert_eq!(config.default_timeout_ms, 30_000);
        assert_eq!(config.max_concurrent_dispatches, 1000);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = ServiceConfig::builder()
            .default_timeout_ms(500)
            .max_concurrent_dispatches(8)
            .build();
        assert_eq!(config.default_timeout_ms, 500);
        assert_eq!(config.max_concurrent_dispatches, 8);
    }

    #[test]
    fn extensions_carry_typed_state() {
        #[derive(Debug, Clone, PartialEq)]
        struct PoolSize(usize);

        let config = ServiceConfig::builder().extension(PoolSize(4)).build();
        assert_eq!(config.extensions.get::<PoolSize>(), Some(&PoolSize(4)));
    }

    #[test]
    fn last_extension_of_a_type_wins() {
        #[derive(Debug, Clone, PartialEq)]
        struct Flag(bool);

        let config = ServiceConfig::builder()
            .extension(Flag(false))
            .extension(Flag(true))
            .build();
        assert_eq!(config.extensions.get::<Flag>(), Some(&Flag(true)));
    }
}
