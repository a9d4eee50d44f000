//! Routing entry types.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of a node in the network (`"MIT"`, `"HARV"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Number of hops to a destination.
///
/// Every finite count orders below [`HopCount::Infinity`]. On the wire a hop
/// count is an integer, or `null` for infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum HopCount {
    /// Reachable in this many hops.
    Finite(u32),
    /// Unreachable.
    #[default]
    Infinity,
}

impl HopCount {
    /// The distance from a node to itself.
    pub const ZERO: Self = HopCount::Finite(0);

    /// Cost of reaching the same destination one hop further away.
    ///
    /// Infinity stays infinity; the finite range saturates into infinity.
    pub fn via_neighbor(self) -> Self {
        match self {
            HopCount::Finite(n) => n.checked_add(1).map_or(HopCount::Infinity, HopCount::Finite),
            HopCount::Infinity => HopCount::Infinity,
        }
    }

    /// Whether this count denotes a usable route.
    pub const fn is_finite(&self) -> bool {
        matches!(self, HopCount::Finite(_))
    }

    /// The finite value, if any.
    pub const fn finite(&self) -> Option<u32> {
        match self {
            HopCount::Finite(n) => Some(*n),
            HopCount::Infinity => None,
        }
    }
}

impl From<u32> for HopCount {
    fn from(n: u32) -> Self {
        HopCount::Finite(n)
    }
}

impl From<Option<u32>> for HopCount {
    fn from(n: Option<u32>) -> Self {
        n.map_or(HopCount::Infinity, HopCount::Finite)
    }
}

impl fmt::Display for HopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HopCount::Finite(n) => write!(f, "{}", n),
            HopCount::Infinity => f.write_str("inf"),
        }
    }
}

impl Serialize for HopCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.finite().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HopCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<u32>::deserialize(deserializer).map(HopCount::from)
    }
}

/// Best known path to one destination.
///
/// Entries order by hop count first, then by next hop, which is the order
/// destinations are listed in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Hops to the destination.
    pub hop_count: HopCount,
    /// Neighbor to forward through. `None` when unreachable.
    pub next_hop: Option<NodeId>,
}

impl RouteEntry {
    /// The sentinel for a destination with no usable route.
    pub const UNREACHABLE: Self = Self {
        hop_count: HopCount::Infinity,
        next_hop: None,
    };

    /// A route of `hop_count` hops through `next_hop`.
    pub fn new(hop_count: HopCount, next_hop: NodeId) -> Self {
        Self {
            hop_count,
            next_hop: Some(next_hop),
        }
    }

    /// The entry a node holds for itself.
    pub fn to_self(name: &NodeId) -> Self {
        Self::new(HopCount::ZERO, name.clone())
    }

    /// Whether the entry denotes a usable route.
    pub fn is_reachable(&self) -> bool {
        self.hop_count.is_finite()
    }
}

impl Default for RouteEntry {
    fn default() -> Self {
        Self::UNREACHABLE
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.next_hop {
            Some(hop) => write!(f, "{} via {}", self.hop_count, hop),
            None => write!(f, "{}", self.hop_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinity_orders_above_every_finite_count() {
        assert!(HopCount::Finite(u32::MAX) < HopCount::Infinity);
        assert!(HopCount::ZERO < HopCount::Finite(1));
    }

    #[test]
    fn via_neighbor_adds_one_hop() {
        assert_eq!(HopCount::ZERO.via_neighbor(), HopCount::Finite(1));
        assert_eq!(HopCount::Finite(7).via_neighbor(), HopCount::Finite(8));
    }

    #[test]
    fn via_neighbor_saturates_into_infinity() {
        assert_eq!(HopCount::Infinity.via_neighbor(), HopCount::Infinity);
        assert_eq!(HopCount::Finite(u32::MAX).via_neighbor(), HopCount::Infinity);
    }

    #[test]
    fn hop_count_uses_null_for_infinity() {
        assert_eq!(serde_json::to_string(&HopCount::Finite(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&HopCount::Infinity).unwrap(), "null");

        let parsed: HopCount = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, HopCount::Infinity);
    }

    #[test]
    fn entries_order_by_hops_then_next_hop() {
        let a = RouteEntry::new(HopCount::Finite(2), NodeId::from("BBN"));
        let b = RouteEntry::new(HopCount::Finite(2), NodeId::from("MIT"));
        let c = RouteEntry::new(HopCount::Finite(1), NodeId::from("SRI"));
        let mut entries = vec![a.clone(), RouteEntry::UNREACHABLE, b.clone(), c.clone()];
        entries.sort();
        assert_eq!(entries, vec![c, a, b, RouteEntry::UNREACHABLE]);
    }

    #[test]
    fn node_id_compares_with_str() {
        let id = NodeId::from("UCLA");
        assert_eq!(id, "UCLA");
        assert_eq!(id.to_string(), "UCLA");
    }
}
