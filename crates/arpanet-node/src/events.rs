//! Routing events for the network timeline.

use std::collections::BTreeSet;

use arpanet_routing::{HopCount, NodeId, RoutingTable, UpdateOutcome, WaveId};
use serde::{Deserialize, Serialize};

/// Events recorded while driving a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoutingEvent {
    /// A node sent its table to a neighbor
    AdvertisementSent {
        from: NodeId,
        to: NodeId,
        routes: usize,
        round: u64,
    },

    /// Relaxation replaced a route
    RouteChanged {
        node: NodeId,
        destination: NodeId,
        hop_count: HopCount,
        next_hop: Option<NodeId>,
        round: u64,
    },

    /// A node stopped hearing from a neighbor
    NeighborStale {
        node: NodeId,
        neighbor: NodeId,
        round: u64,
    },

    /// A node wiped its table
    TableWiped {
        node: NodeId,
        wave: WaveId,
        round: u64,
    },

    /// A message to a silenced node was dropped
    MessageDropped {
        node: NodeId,
        round: u64,
    },
}

impl RoutingEvent {
    /// Get the round number for this event.
    pub fn round(&self) -> u64 {
        match self {
            RoutingEvent::AdvertisementSent { round, .. } => *round,
            RoutingEvent::RouteChanged { round, .. } => *round,
            RoutingEvent::NeighborStale { round, .. } => *round,
            RoutingEvent::TableWiped { round, .. } => *round,
            RoutingEvent::MessageDropped { round, .. } => *round,
        }
    }

    /// The node the event happened at.
    pub fn node(&self) -> &NodeId {
        match self {
            RoutingEvent::AdvertisementSent { from, .. } => from,
            RoutingEvent::RouteChanged { node, .. } => node,
            RoutingEvent::NeighborStale { node, .. } => node,
            RoutingEvent::TableWiped { node, .. } => node,
            RoutingEvent::MessageDropped { node, .. } => node,
        }
    }
}

/// Events describing what one `update` call did to `table`.
pub(crate) fn update_events(
    table: &RoutingTable,
    outcome: &UpdateOutcome,
    round: u64,
) -> Vec<RoutingEvent> {
    let node = table.name();
    let mut events = Vec::new();

    for neighbor in &outcome.stale {
        events.push(RoutingEvent::NeighborStale {
            node: node.clone(),
            neighbor: neighbor.clone(),
            round,
        });
    }

    let waves: BTreeSet<&WaveId> = outcome
        .caught_up
        .iter()
        .chain(outcome.notices.iter().map(|(_, notice)| &notice.wave))
        .collect();
    for wave in waves {
        events.push(RoutingEvent::TableWiped {
            node: node.clone(),
            wave: wave.clone(),
            round,
        });
    }

    for destination in &outcome.changed {
        let entry = table.route(destination.as_str()).cloned().unwrap_or_default();
        events.push(RoutingEvent::RouteChanged {
            node: node.clone(),
            destination: destination.clone(),
            hop_count: entry.hop_count,
            next_hop: entry.next_hop,
            round,
        });
    }

    events
}

/// Event totals by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub advertisements: usize,
    pub route_changes: usize,
    pub stale_neighbors: usize,
    pub wipes: usize,
    pub dropped: usize,
}

impl EventCounts {
    /// Tally a slice of events.
    pub fn tally(events: &[RoutingEvent]) -> Self {
        let mut counts = Self::default();
        for event in events {
            match event {
                RoutingEvent::AdvertisementSent { .. } => counts.advertisements += 1,
                RoutingEvent::RouteChanged { .. } => counts.route_changes += 1,
                RoutingEvent::NeighborStale { .. } => counts.stale_neighbors += 1,
                RoutingEvent::TableWiped { .. } => counts.wipes += 1,
                RoutingEvent::MessageDropped { .. } => counts.dropped += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = RoutingEvent::NeighborStale {
            node: NodeId::from("SRI"),
            neighbor: NodeId::from("UTAH"),
            round: 12,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "NeighborStale");
        assert_eq!(value["neighbor"], "UTAH");
        assert_eq!(event.round(), 12);
        assert_eq!(event.node(), "SRI");
    }

    #[test]
    fn tally_counts_each_kind() {
        let events = vec![
            RoutingEvent::MessageDropped {
                node: NodeId::from("A"),
                round: 0,
            },
            RoutingEvent::MessageDropped {
                node: NodeId::from("B"),
                round: 1,
            },
            RoutingEvent::RouteChanged {
                node: NodeId::from("A"),
                destination: NodeId::from("B"),
                hop_count: HopCount::Finite(1),
                next_hop: Some(NodeId::from("B")),
                round: 1,
            },
        ];
        let counts = EventCounts::tally(&events);
        assert_eq!(counts.dropped, 2);
        assert_eq!(counts.route_changes, 1);
        assert_eq!(counts.wipes, 0);
    }
}
