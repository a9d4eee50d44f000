//! Deterministic round-based driver with event recording.
//!
//! Every round, each live node sends its advertisement to every neighbor;
//! the messages are then delivered from one FIFO queue, together with the
//! invalidation notices they cause, until the queue is empty. Nodes only
//! talk through the queue, exactly as they do through actor inboxes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use arpanet_routing::{
    Advertisement, HopCount, InvalidationNotice, NodeId, OutboundNotice, RoutingConfig, RoutingTable,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::{update_events, RoutingEvent};
use crate::topology::Topology;

/// A message in flight between two nodes.
#[derive(Debug, Clone)]
enum Delivery {
    Advertise(Advertisement),
    Invalidate(InvalidationNotice),
}

/// A network of routing tables driven in lockstep rounds.
pub struct LockstepNetwork {
    topology: Topology,
    tables: BTreeMap<NodeId, RoutingTable>,
    silenced: BTreeSet<NodeId>,
    queue: VecDeque<(NodeId, Delivery)>,
    events: Vec<RoutingEvent>,
    round: u64,
}

impl LockstepNetwork {
    /// Create one routing table per node of `topology`.
    pub fn new(topology: Topology, config: RoutingConfig) -> Result<Self> {
        let mut tables = BTreeMap::new();
        for node in topology.nodes() {
            let mut table = RoutingTable::with_config(node.clone(), config)?;
            for neighbor in topology.neighbors(node.as_str()) {
                table.connect(neighbor.clone());
            }
            tables.insert(node.clone(), table);
        }

        Ok(Self {
            topology,
            tables,
            silenced: BTreeSet::new(),
            queue: VecDeque::new(),
            events: Vec::new(),
            round: 0,
        })
    }

    /// The routing table of `node`.
    pub fn table(&self, node: &str) -> Result<&RoutingTable> {
        self.tables
            .get(node)
            .ok_or_else(|| Error::UnknownNode(NodeId::from(node)))
    }

    /// The topology being simulated.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Rounds completed so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// All recorded events.
    pub fn events(&self) -> &[RoutingEvent] {
        &self.events
    }

    /// Stop `node` from sending or receiving anything.
    pub fn silence(&mut self, node: &str) -> Result<()> {
        self.table(node)?;
        self.silenced.insert(NodeId::from(node));
        Ok(())
    }

    /// Let a silenced node take part again, with whatever table it had.
    pub fn revive(&mut self, node: &str) -> Result<()> {
        self.table(node)?;
        self.silenced.remove(node);
        Ok(())
    }

    /// Whether `node` is silenced.
    pub fn is_silenced(&self, node: &str) -> bool {
        self.silenced.contains(node)
    }

    /// Run one advertisement round and deliver everything it causes.
    pub fn step(&mut self) {
        self.round += 1;

        for (node, table) in &self.tables {
            if self.silenced.contains(node) {
                continue;
            }
            let advertisement = table.advertisement();
            for neighbor in self.topology.neighbors(node.as_str()) {
                self.events.push(RoutingEvent::AdvertisementSent {
                    from: node.clone(),
                    to: neighbor.clone(),
                    routes: advertisement.routes.len(),
                    round: self.round,
                });
                self.queue
                    .push_back((neighbor.clone(), Delivery::Advertise(advertisement.clone())));
            }
        }

        while let Some((to, delivery)) = self.queue.pop_front() {
            self.deliver(to, delivery);
        }
    }

    /// Run `rounds` rounds.
    pub fn run(&mut self, rounds: usize) {
        for _ in 0..rounds {
            self.step();
        }
    }

    fn deliver(&mut self, to: NodeId, delivery: Delivery) {
        let round = self.round;
        if self.silenced.contains(&to) {
            debug!(node = %to, "dropping message to silenced node");
            self.events.push(RoutingEvent::MessageDropped { node: to, round });
            return;
        }
        let Some(table) = self.tables.get_mut(&to) else {
            return;
        };

        let notices: Vec<OutboundNotice> = match delivery {
            Delivery::Advertise(advertisement) => {
                let outcome = table.update(&advertisement);
                self.events.extend(update_events(table, &outcome, round));
                outcome.notices
            }
            Delivery::Invalidate(notice) => {
                let wave = notice.wave.clone();
                let outcome = table.invalidate(notice);
                if outcome.applied {
                    self.events.push(RoutingEvent::TableWiped {
                        node: to.clone(),
                        wave,
                        round,
                    });
                }
                outcome.forward
            }
        };

        for (next, notice) in notices {
            self.queue.push_back((next, Delivery::Invalidate(notice)));
        }
    }

    /// Whether every live node's hop counts match shortest paths over the
    /// live part of the topology.
    pub fn is_converged(&self) -> bool {
        let excluded: Vec<&str> = self.silenced.iter().map(NodeId::as_str).collect();
        self.tables.iter().all(|(node, table)| {
            if self.silenced.contains(node) {
                return true;
            }
            let expected = self.topology.distances_avoiding(node.as_str(), &excluded);
            self.topology.nodes().all(|dest| {
                let want = expected
                    .get(dest)
                    .map_or(HopCount::Infinity, |&d| HopCount::Finite(d));
                table.hop_count(dest.as_str()) == want
            })
        })
    }

    /// Step until converged, giving up after `max_rounds`.
    ///
    /// Returns the number of rounds run.
    pub fn run_until_converged(&mut self, max_rounds: usize) -> Option<usize> {
        for done in 0..=max_rounds {
            if self.is_converged() {
                return Some(done);
            }
            if done < max_rounds {
                self.step();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCounts;

    fn network(topology: Topology, threshold: u64) -> LockstepNetwork {
        LockstepNetwork::new(topology, RoutingConfig::with_stale_threshold(threshold)).unwrap()
    }

    #[test]
    fn starts_with_self_entries_only() {
        let net = network(Topology::arpanet_1969(), 20);
        let ucla = net.table("UCLA").unwrap();
        assert_eq!(ucla.hop_count("UCLA"), HopCount::ZERO);
        assert_eq!(ucla.hop_count("SRI"), HopCount::Infinity);
        assert!(!net.is_converged());
    }

    #[test]
    fn first_round_teaches_direct_neighbors() {
        let mut net = network(Topology::arpanet_1969(), 20);
        net.step();

        let ucla = net.table("UCLA").unwrap();
        assert_eq!(ucla.hop_count("SRI"), HopCount::Finite(1));
        assert_eq!(ucla.best_link("SRI").unwrap(), "SRI");
        assert_eq!(ucla.hop_count("UTAH"), HopCount::Infinity);
    }

    #[test]
    fn converges_within_diameter_rounds() {
        let map = Topology::arpanet();
        let diameter = map.diameter() as usize;
        let mut net = network(map, 20);

        let rounds = net.run_until_converged(diameter).unwrap();
        assert!(rounds <= diameter);

        let harv = net.table("HARV").unwrap();
        assert_eq!(harv.hop_count("BBN"), HopCount::Finite(1));
        assert_eq!(harv.hop_count("UCLA"), HopCount::Finite(3));
        assert_eq!(harv.best_link("UCLA").unwrap(), "BBN");
    }

    #[test]
    fn unknown_node_is_an_error() {
        let mut net = network(Topology::arpanet_1969(), 20);
        assert!(matches!(net.table("MIT"), Err(Error::UnknownNode(_))));
        assert!(net.silence("MIT").is_err());
    }

    #[test]
    fn isolated_node_learns_nothing() {
        let mut topology = Topology::arpanet_1969();
        topology.add_node("LINC").unwrap();
        let mut net = network(topology, 20);
        net.run(10);

        let linc = net.table("LINC").unwrap();
        assert_eq!(linc.tick(), 0);
        assert_eq!(linc.hop_count("UCLA"), HopCount::Infinity);
        assert_eq!(net.table("UCLA").unwrap().hop_count("LINC"), HopCount::Infinity);
        assert!(net.is_converged());
    }

    #[test]
    fn silenced_node_is_routed_around() {
        let map = Topology::arpanet();
        let mut net = network(map, 20);
        net.run_until_converged(10).unwrap();
        assert_eq!(net.table("UCLA").unwrap().best_link("UTAH").unwrap(), "SRI");

        net.silence("SRI").unwrap();
        let rounds = net.run_until_converged(60);
        assert!(rounds.is_some(), "network reconverged without SRI");

        let ucla = net.table("UCLA").unwrap();
        assert_eq!(ucla.hop_count("SRI"), HopCount::Infinity);
        assert_eq!(ucla.best_link("SRI"), None);
        // UCLA-RAND-SDC-UTAH now.
        assert_eq!(ucla.hop_count("UTAH"), HopCount::Finite(3));
        assert_eq!(ucla.best_link("UTAH").unwrap(), "RAND");

        let counts = EventCounts::tally(net.events());
        assert!(counts.stale_neighbors >= 1);
        assert!(counts.wipes >= net.topology().len() - 1);
        assert!(counts.dropped > 0);
    }

    #[test]
    fn each_wave_wipes_each_node_once() {
        let mut net = network(Topology::arpanet(), 20);
        net.run_until_converged(10).unwrap();
        net.silence("CASE").unwrap();
        net.run(60);

        let mut per_wave: BTreeMap<(NodeId, u64, NodeId), usize> = BTreeMap::new();
        for event in net.events() {
            if let RoutingEvent::TableWiped { node, wave, .. } = event {
                *per_wave
                    .entry((wave.origin.clone(), wave.seq, node.clone()))
                    .or_insert(0) += 1;
            }
        }
        assert!(!per_wave.is_empty());
        assert!(per_wave.values().all(|&n| n == 1));
    }

    #[test]
    fn revived_node_rejoins() {
        let mut net = network(Topology::arpanet_1969(), 4);
        net.run_until_converged(5).unwrap();

        net.silence("UTAH").unwrap();
        net.run_until_converged(40).unwrap();
        assert_eq!(net.table("UCLA").unwrap().hop_count("UTAH"), HopCount::Infinity);

        net.revive("UTAH").unwrap();
        net.run_until_converged(40).unwrap();
        assert_eq!(net.table("UCLA").unwrap().hop_count("UTAH"), HopCount::Finite(2));
        assert_eq!(net.table("UTAH").unwrap().hop_count("UCSB"), HopCount::Finite(2));
    }

    #[test]
    fn events_are_ordered_by_round() {
        let mut net = network(Topology::arpanet_1969(), 20);
        net.run(3);
        let rounds: Vec<u64> = net.events().iter().map(RoutingEvent::round).collect();
        assert!(rounds.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(net.round(), 3);
    }
}
