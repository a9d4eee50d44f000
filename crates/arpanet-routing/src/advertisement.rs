//! Periodic advertisement exchanged between neighbors.
//!
//! A node advertises its whole table to every neighbor at a fixed interval.
//! The receiving node relaxes its own table against it (see
//! [`RoutingTable::update`](crate::RoutingTable::update)).

use serde::{Deserialize, Serialize};

use crate::entry::{HopCount, NodeId, RouteEntry};
use crate::error::Result;
use crate::invalidation::AppliedWave;

/// One destination as seen by the advertising node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisedRoute {
    /// Destination node.
    pub destination: NodeId,
    /// Hops from the sender to the destination, `null` for infinity.
    pub hop_count: HopCount,
    /// Sender's next hop toward the destination.
    pub next_hop: Option<NodeId>,
}

impl AdvertisedRoute {
    /// Build an advertised route from a table entry.
    pub fn from_entry(destination: NodeId, entry: &RouteEntry) -> Self {
        Self {
            destination,
            hop_count: entry.hop_count,
            next_hop: entry.next_hop.clone(),
        }
    }
}

/// A node's routing table as sent to its neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    /// The advertising node.
    pub sender: NodeId,
    /// Every destination the sender knows about.
    pub routes: Vec<AdvertisedRoute>,
    /// Invalidation waves the sender has applied. Absent on the wire when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waves: Vec<AppliedWave>,
}

impl Advertisement {
    /// Create an advertisement with no applied waves.
    pub fn new(sender: NodeId, routes: Vec<AdvertisedRoute>) -> Self {
        Self {
            sender,
            routes,
            waves: Vec::new(),
        }
    }

    /// Attach the sender's applied waves.
    pub fn with_waves(mut self, waves: Vec<AppliedWave>) -> Self {
        self.waves = waves;
        self
    }

    /// Hop count the sender advertises for `destination`.
    pub fn hop_count(&self, destination: &str) -> HopCount {
        self.routes
            .iter()
            .find(|r| r.destination == *destination)
            .map_or(HopCount::Infinity, |r| r.hop_count)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_matches_documented_shape() {
        let adv = Advertisement::new(
            NodeId::from("BBN"),
            vec![
                AdvertisedRoute {
                    destination: NodeId::from("BBN"),
                    hop_count: HopCount::ZERO,
                    next_hop: Some(NodeId::from("BBN")),
                },
                AdvertisedRoute {
                    destination: NodeId::from("RAND"),
                    hop_count: HopCount::Infinity,
                    next_hop: None,
                },
            ],
        );

        let value: serde_json::Value = serde_json::from_str(&adv.to_json().unwrap()).unwrap();
        assert_eq!(value["sender"], "BBN");
        assert_eq!(value["routes"][0]["hop_count"], 0);
        assert_eq!(value["routes"][0]["next_hop"], "BBN");
        assert!(value["routes"][1]["hop_count"].is_null());
        assert!(value["routes"][1]["next_hop"].is_null());
        assert!(value.get("waves").is_none());
    }

    #[test]
    fn applied_waves_travel_with_the_routes() {
        use crate::invalidation::WaveId;

        let adv = Advertisement::new(NodeId::from("SRI"), Vec::new()).with_waves(vec![AppliedWave {
            wave: WaveId {
                origin: NodeId::from("UCLA"),
                seq: 3,
            },
            failed: NodeId::from("UCSB"),
        }]);
        let decoded = Advertisement::from_json(&adv.to_json().unwrap()).unwrap();
        assert_eq!(decoded, adv);
    }

    #[test]
    fn decodes_hand_written_message() {
        let json = r#"{"sender":"MIT","routes":[
            {"destination":"MIT","hop_count":0,"next_hop":"MIT"},
            {"destination":"LINC","hop_count":1,"next_hop":"LINC"}
        ]}"#;
        let adv = Advertisement::from_json(json).unwrap();
        assert_eq!(adv.sender, "MIT");
        assert_eq!(adv.hop_count("LINC"), HopCount::Finite(1));
        assert_eq!(adv.hop_count("UTAH"), HopCount::Infinity);
    }

    #[test]
    fn malformed_message_is_an_error() {
        assert!(Advertisement::from_json(r#"{"sender":"MIT"}"#).is_err());
        assert!(Advertisement::from_json(r#"{"sender":"MIT","routes":[{"destination":"X","hop_count":-1,"next_hop":null}]}"#).is_err());
    }
}
