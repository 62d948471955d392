//! Builder pattern for pool configuration.
//!
//! Provides a fluent API for configuring and creating [`Pool`] instances.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use wspool::{Pool, WsConnector};
//!
//! let pool = Pool::builder()
//!     .ttl(Duration::from_secs(30))
//!     .delay(Duration::from_millis(100))
//!     .build(WsConnector::new("ws://127.0.0.1:9000")?)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;
use crate::transport::Connector;

use super::config::PoolConfig;
use super::core::Pool;

// ============================================================================
// PoolBuilder
// ============================================================================

/// Builder for configuring a [`Pool`] instance.
///
/// Use [`Pool::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct PoolBuilder {
    /// Timing settings.
    config: PoolConfig,
}

// ============================================================================
// PoolBuilder Implementation
// ============================================================================

impl PoolBuilder {
    /// Creates a new builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long a connection may stay idle before it is torn down.
    #[inline]
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Sets the minimum spacing between successive units of work.
    #[inline]
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Replaces all settings at once.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the pool with validation.
    ///
    /// The pool's actor is not started until the first call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the settings are
    /// invalid.
    pub fn build<K: Connector>(self, connector: K) -> Result<Pool<K>> {
        Pool::new(connector, self.config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = PoolBuilder::new();
        assert_eq!(builder.config, PoolConfig::default());
    }

    #[test]
    fn test_builder_setters() {
        let builder = PoolBuilder::new()
            .ttl(Duration::from_secs(5))
            .delay(Duration::from_millis(20));

        assert_eq!(builder.config.ttl, Duration::from_secs(5));
        assert_eq!(builder.config.delay, Duration::from_millis(20));
    }

    #[test]
    fn test_builder_config_replaces_settings() {
        let config = PoolConfig::new(Duration::from_secs(1), Duration::from_secs(2));
        let builder = PoolBuilder::new().ttl(Duration::from_secs(9)).config(config);
        assert_eq!(builder.config, config);
    }
}
