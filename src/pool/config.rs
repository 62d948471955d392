//! Pool timing configuration.
//!
//! # Example
//!
//! ```ignore
//! use wspool::PoolConfig;
//!
//! let config: PoolConfig = serde_json::from_str(r#"{ "ttl_ms": 30000, "delay_ms": 250 }"#)?;
//! assert_eq!(config.delay.as_millis(), 250);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default idle lifetime of a connection.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default spacing between units of work.
pub const DEFAULT_DELAY: Duration = Duration::ZERO;

// ============================================================================
// PoolConfig
// ============================================================================

/// Timing settings of a pool, fixed for its lifetime.
///
/// Serialized with millisecond fields: `ttl_ms` and `delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// How long a connection may stay idle before it is torn down.
    #[serde(rename = "ttl_ms", with = "millis")]
    pub ttl: Duration,

    /// Minimum spacing between the end of one unit of work and the start
    /// of the next.
    #[serde(rename = "delay_ms", with = "millis")]
    pub delay: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            delay: DEFAULT_DELAY,
        }
    }
}

impl PoolConfig {
    /// Creates a configuration from explicit durations.
    #[inline]
    #[must_use]
    pub const fn new(ttl: Duration, delay: Duration) -> Self {
        Self { ttl, delay }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `ttl` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(Error::config("ttl must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Millisecond (de)serialization
// ============================================================================

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.delay, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = PoolConfig::new(Duration::ZERO, Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PoolConfig = serde_json::from_str(r#"{ "delay_ms": 250 }"#).expect("valid json");
        assert_eq!(config.ttl, DEFAULT_TTL);
        assert_eq!(config.delay, Duration::from_millis(250));
    }

    #[test]
    fn test_serialize_uses_millis() {
        let config = PoolConfig::new(Duration::from_secs(2), Duration::from_millis(5));
        let json = serde_json::to_value(config).expect("serializable");
        assert_eq!(json["ttl_ms"], 2000);
        assert_eq!(json["delay_ms"], 5);
    }

    proptest! {
        #[test]
        fn prop_deserialized_millis_match(ttl_ms in 0u64..10_000_000, delay_ms in 0u64..10_000_000) {
            let text = format!(r#"{{ "ttl_ms": {ttl_ms}, "delay_ms": {delay_ms} }}"#);
            let config: PoolConfig = serde_json::from_str(&text).expect("valid json");
            prop_assert_eq!(config.ttl, Duration::from_millis(ttl_ms));
            prop_assert_eq!(config.delay, Duration::from_millis(delay_ms));
            prop_assert_eq!(config.validate().is_ok(), ttl_ms > 0);
        }
    }
}
