//! Error types for arpanet-node.

use arpanet_routing::NodeId;
use thiserror::Error;

/// Result type for arpanet-node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving a network of nodes.
#[derive(Debug, Error)]
pub enum Error {
    /// No node with this name exists.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A node with this name was already added.
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// A link from a node to itself was requested.
    #[error("node cannot link to itself: {0}")]
    SelfLink(NodeId),

    /// The node's task has exited; its inbox is closed.
    #[error("node {0} has stopped")]
    NodeStopped(NodeId),

    /// A configuration value could not be parsed or is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A node task panicked or was cancelled.
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Routing core error.
    #[error("routing error: {0}")]
    Routing(#[from] arpanet_routing::Error),
}
