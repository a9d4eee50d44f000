//! Network configuration.

use std::str::FromStr;
use std::time::Duration;

use arpanet_routing::{NodeId, RoutingConfig};

use crate::error::{Error, Result};

/// How the simulator drives the nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// One tokio task per node, messages over mpsc inboxes.
    Actors,
    /// Deterministic single-threaded rounds.
    Lockstep,
}

impl FromStr for DriveMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "actors" => Ok(DriveMode::Actors),
            "lockstep" => Ok(DriveMode::Lockstep),
            other => Err(Error::InvalidConfig(format!("unknown mode: {}", other))),
        }
    }
}

/// Configuration for a simulated network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Routing table config shared by every node.
    pub routing: RoutingConfig,
    /// Capacity of each node's inbox. Advertisements to a full inbox are dropped.
    pub inbox_capacity: usize,
    /// Advertisement rounds to run before and after silencing a node.
    pub rounds: usize,
    /// Pause between scheduled rounds.
    pub round_interval: Duration,
    /// Node to silence halfway through the run.
    pub silence: Option<NodeId>,
    /// Node whose table is reported.
    pub observer: NodeId,
    /// Driver used by the simulator.
    pub mode: DriveMode,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            routing: RoutingConfig::default(),
            inbox_capacity: 1024,
            rounds: 40,
            round_interval: Duration::from_millis(10),
            silence: None,
            observer: NodeId::from("HARV"),
            mode: DriveMode::Actors,
        }
    }
}

impl NetworkConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let stale_threshold = env_parse(
            "ARPANET_STALE_THRESHOLD",
            defaults.routing.stale_threshold,
        )?;
        let inbox_capacity = env_parse("ARPANET_INBOX_CAPACITY", defaults.inbox_capacity)?;
        let rounds = env_parse("ARPANET_ROUNDS", defaults.rounds)?;
        let interval_ms = env_parse(
            "ARPANET_ROUND_INTERVAL_MS",
            defaults.round_interval.as_millis() as u64,
        )?;

        let silence = std::env::var("ARPANET_SILENCE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(NodeId::from);

        let observer = std::env::var("ARPANET_OBSERVER")
            .map(|s| NodeId::from(s.trim()))
            .unwrap_or(defaults.observer);

        let mode = match std::env::var("ARPANET_MODE") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.mode,
        };

        let config = Self {
            routing: RoutingConfig::with_stale_threshold(stale_threshold),
            inbox_capacity,
            rounds,
            round_interval: Duration::from_millis(interval_ms),
            silence,
            observer,
            mode,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check for values the network cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.routing.validate()?;
        if self.inbox_capacity == 0 {
            return Err(Error::InvalidConfig("inbox_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NetworkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.stale_threshold, 20);
        assert_eq!(config.mode, DriveMode::Actors);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = NetworkConfig {
            inbox_capacity: 0,
            ..NetworkConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_threshold_is_a_routing_error() {
        let config = NetworkConfig {
            routing: RoutingConfig::with_stale_threshold(0),
            ..NetworkConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Routing(_))));
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Lockstep".parse::<DriveMode>().unwrap(), DriveMode::Lockstep);
        assert_eq!("actors".parse::<DriveMode>().unwrap(), DriveMode::Actors);
        assert!("carrier-pigeon".parse::<DriveMode>().is_err());
    }

    #[test]
    fn env_parse_reports_the_bad_key() {
        let key = "ARPANET_TEST_ENV_PARSE_BAD";
        std::env::set_var(key, "twenty");
        let err = env_parse::<u64>(key, 20).unwrap_err();
        std::env::remove_var(key);
        assert!(err.to_string().contains(key));
    }

    #[test]
    fn env_parse_falls_back_to_default() {
        assert_eq!(env_parse::<u64>("ARPANET_TEST_ENV_PARSE_UNSET", 7).unwrap(), 7);
    }
}
