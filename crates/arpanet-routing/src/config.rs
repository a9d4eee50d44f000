//! Routing table configuration.

use crate::error::{Error, Result};

/// Ticks without an advertisement after which a neighbor is considered dead.
pub const DEFAULT_STALE_THRESHOLD: u64 = 20;

/// Per-node routing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Number of logical ticks a neighbor may stay silent.
    ///
    /// Measured against the receiving node's own tick counter, which advances
    /// once per advertisement received from any neighbor.
    pub stale_threshold: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            stale_threshold: DEFAULT_STALE_THRESHOLD,
        }
    }
}

impl RoutingConfig {
    /// Config with a custom staleness threshold.
    pub const fn with_stale_threshold(stale_threshold: u64) -> Self {
        Self { stale_threshold }
    }

    /// Check the config for values the table cannot work with.
    ///
    /// A threshold of zero would declare the advertising neighbor stale in
    /// the same update that refreshed it.
    pub fn validate(&self) -> Result<()> {
        if self.stale_threshold == 0 {
            return Err(Error::InvalidConfig(
                "stale_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_twenty() {
        assert_eq!(RoutingConfig::default().stale_threshold, 20);
        assert!(RoutingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = RoutingConfig::with_stale_threshold(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
