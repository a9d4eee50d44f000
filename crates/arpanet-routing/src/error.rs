//! Error types for arpanet-routing.

use thiserror::Error;

/// Result type for arpanet-routing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the edges of the routing core.
///
/// Routing operations themselves never fail: an unknown or stale destination
/// is reported as [`RouteEntry::UNREACHABLE`](crate::RouteEntry::UNREACHABLE).
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is out of range.
    #[error("invalid routing config: {0}")]
    InvalidConfig(String),

    /// An advertisement could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
