//! ARPANET Node Runtime
//!
//! Runs a network of [`arpanet_routing::RoutingTable`]s that only talk
//! through messages.
//!
//! # Architecture
//!
//! - **Actors**: one tokio task per node, owning its table, fed by an mpsc inbox
//! - **Network**: wires actors along a [`Topology`] and drives broadcast rounds
//! - **Lockstep**: deterministic single-threaded driver for reproducible runs
//! - **Events**: serializable timeline of what each node did
//!
//! # Usage
//!
//! ```ignore
//! let mut net = Network::spawn(Topology::arpanet(), RoutingConfig::default(), 1024)?;
//! net.run_rounds(10).await?;
//! let entry = net.route("HARV", "UCLA").await?;
//! ```

mod actor;
mod config;
mod error;
mod events;
mod lockstep;
mod message;
mod network;
mod topology;

pub use config::{DriveMode, NetworkConfig};
pub use error::{Error, Result};
pub use events::{EventCounts, RoutingEvent};
pub use lockstep::LockstepNetwork;
pub use message::{Inflight, NodeHandle, NodeMessage};
pub use network::{spawn_scheduler, Network};
pub use topology::{Topology, ARPANET_LINKS};
