//! Network topology: nodes and bidirectional links.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use arpanet_routing::NodeId;

use crate::error::{Error, Result};

/// Undirected graph of nodes and their direct links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    links: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

/// Links of the early-1970s ARPANET map, as host-site pairs.
///
/// An approximation of the logical map used to exercise the routing
/// algorithm, not a surveyed record of the IMP circuits.
pub const ARPANET_LINKS: &[(&str, &str)] = &[
    ("UCSB", "SRI"),
    ("UCSB", "UCLA"),
    ("SRI", "UCLA"),
    ("SRI", "UTAH"),
    ("SRI", "STAN"),
    ("STAN", "AMES"),
    ("AMES", "UCLA"),
    ("UCLA", "RAND"),
    ("RAND", "SDC"),
    ("SDC", "UTAH"),
    ("UTAH", "ILL"),
    ("ILL", "MIT"),
    ("RAND", "BBN"),
    ("BBN", "HARV"),
    ("BBN", "MIT"),
    ("MIT", "LINC"),
    ("LINC", "CASE"),
    ("CASE", "CARN"),
    ("CARN", "HARV"),
    ("BBN", "MITRE"),
    ("MITRE", "BURR"),
    ("BURR", "CARN"),
];

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ARPANET map of [`ARPANET_LINKS`].
    pub fn arpanet() -> Self {
        Self::from_links(ARPANET_LINKS)
    }

    /// The four-node network of December 1969.
    pub fn arpanet_1969() -> Self {
        Self::from_links(&[
            ("UCLA", "SRI"),
            ("UCLA", "UCSB"),
            ("SRI", "UCSB"),
            ("SRI", "UTAH"),
        ])
    }

    /// Build a topology from name pairs, adding nodes as they appear.
    ///
    /// Pairs linking a node to itself are skipped.
    pub fn from_links(pairs: &[(&str, &str)]) -> Self {
        let mut topology = Self::new();
        for &(a, b) in pairs {
            if a == b {
                continue;
            }
            topology.insert_link(NodeId::from(a), NodeId::from(b));
        }
        topology
    }

    /// Add an isolated node.
    pub fn add_node(&mut self, node: impl Into<NodeId>) -> Result<()> {
        let node = node.into();
        if self.links.contains_key(&node) {
            return Err(Error::DuplicateNode(node));
        }
        self.links.insert(node, BTreeSet::new());
        Ok(())
    }

    /// Link two existing nodes. Linking an already linked pair is a no-op.
    pub fn add_link(&mut self, a: &str, b: &str) -> Result<()> {
        if a == b {
            return Err(Error::SelfLink(NodeId::from(a)));
        }
        for node in [a, b] {
            if !self.links.contains_key(node) {
                return Err(Error::UnknownNode(NodeId::from(node)));
            }
        }
        self.insert_link(NodeId::from(a), NodeId::from(b));
        Ok(())
    }

    fn insert_link(&mut self, a: NodeId, b: NodeId) {
        self.links.entry(a.clone()).or_default().insert(b.clone());
        self.links.entry(b).or_default().insert(a);
    }

    /// All nodes, by name.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.links.keys()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the topology has no nodes.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Whether `node` is part of the topology.
    pub fn contains(&self, node: &str) -> bool {
        self.links.contains_key(node)
    }

    /// Direct neighbors of `node`.
    pub fn neighbors(&self, node: &str) -> impl Iterator<Item = &NodeId> {
        self.links.get(node).into_iter().flatten()
    }

    /// Whether `a` and `b` share a link.
    pub fn are_linked(&self, a: &str, b: &str) -> bool {
        self.links.get(a).is_some_and(|n| n.contains(b))
    }

    /// Hop distances from `from` to every reachable node.
    pub fn distances(&self, from: &str) -> BTreeMap<NodeId, u32> {
        self.distances_avoiding(from, &[])
    }

    /// Hop distances from `from`, treating `excluded` nodes as absent.
    pub fn distances_avoiding(&self, from: &str, excluded: &[&str]) -> BTreeMap<NodeId, u32> {
        let mut dist = BTreeMap::new();
        let Some((start, _)) = self.links.get_key_value(from) else {
            return dist;
        };
        if excluded.contains(&from) {
            return dist;
        }

        dist.insert(start.clone(), 0);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            let d = dist[node];
            for next in self.neighbors(node.as_str()) {
                if excluded.contains(&next.as_str()) || dist.contains_key(next) {
                    continue;
                }
                dist.insert(next.clone(), d + 1);
                queue.push_back(next);
            }
        }
        dist
    }

    /// Longest shortest path between any two connected nodes.
    pub fn diameter(&self) -> u32 {
        self.nodes()
            .filter_map(|n| self.distances(n.as_str()).into_values().max())
            .max()
            .unwrap_or(0)
    }
}
