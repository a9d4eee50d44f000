//! ARPANET Distance-Vector Routing
//!
//! The per-node control plane of a distance-vector routing protocol in the
//! style of the original ARPANET algorithm. Each node keeps a table mapping
//! every known destination to a hop count and the neighbor to forward through.
//!
//! # Design
//!
//! Neighbors periodically send their whole table as an [`Advertisement`].
//! Receiving one advances the node's logical clock and relaxes the local
//! table: a path through the sender replaces the local entry when it is no
//! longer (Bellman-Ford, ties going to the latest advertiser).
//!
//! # Failure Handling
//!
//! A neighbor that has not advertised for `stale_threshold` ticks is dead.
//! The node wipes its table and starts an invalidation wave that every node
//! in the connected neighbor graph applies exactly once. Tables then
//! reconverge from subsequent advertisements; advertisements computed before
//! a wipe are recognised by the waves they carry and contribute nothing but
//! the direct route to their sender.
//!
//! [`RoutingTable`] is a pure state machine: it never reaches into another
//! node's table. Delivering advertisements and notices is up to the caller.
//!
//! # Example
//!
//! ```
//! use arpanet_routing::{HopCount, NodeId, RoutingTable};
//!
//! let mut bbn = RoutingTable::new("BBN");
//! let mut mit = RoutingTable::new("MIT");
//!
//! mit.update(&bbn.advertisement());
//! bbn.update(&mit.advertisement());
//!
//! assert_eq!(mit.hop_count("BBN"), HopCount::Finite(1));
//! assert_eq!(bbn.best_link("MIT").map(NodeId::as_str), Some("MIT"));
//! assert_eq!(bbn.hop_count("UTAH"), HopCount::Infinity);
//! ```

mod advertisement;
mod config;
mod entry;
mod error;
mod invalidation;
mod table;

pub use advertisement::{AdvertisedRoute, Advertisement};
pub use config::{RoutingConfig, DEFAULT_STALE_THRESHOLD};
pub use entry::{HopCount, NodeId, RouteEntry};
pub use error::{Error, Result};
pub use invalidation::{AppliedWave, InvalidationNotice, WaveId};
pub use table::{InvalidationOutcome, OutboundNotice, RoutingTable, TableSnapshot, UpdateOutcome};
