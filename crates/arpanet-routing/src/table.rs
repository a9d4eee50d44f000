//! Per-node routing table.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::advertisement::{AdvertisedRoute, Advertisement};
use crate::config::RoutingConfig;
use crate::entry::{HopCount, NodeId, RouteEntry};
use crate::error::Result;
use crate::invalidation::{InvalidationNotice, WaveId, WaveLog};

/// A notice together with the neighbor it must be delivered to.
pub type OutboundNotice = (NodeId, InvalidationNotice);

/// Result of a [`RoutingTable::update`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Neighbors declared stale during this update.
    pub stale: Vec<NodeId>,
    /// Waves the sender had applied and this node had missed.
    pub caught_up: Vec<WaveId>,
    /// Destinations whose entry was replaced by relaxation.
    pub changed: Vec<NodeId>,
    /// Invalidation notices to deliver to neighbors.
    pub notices: Vec<OutboundNotice>,
}

impl UpdateOutcome {
    /// Whether the table was wiped during this update.
    pub fn wiped(&self) -> bool {
        !self.stale.is_empty() || !self.caught_up.is_empty()
    }
}

/// Result of a [`RoutingTable::invalidate`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationOutcome {
    /// False when the wave had already been applied here.
    pub applied: bool,
    /// Notices to forward to neighbors not yet reached by the wave.
    pub forward: Vec<OutboundNotice>,
}

/// Routing table of one node.
///
/// Maps every known destination to the hop count and next hop of the best
/// path seen so far. The table owns only its own state: neighbors' tables
/// arrive as [`Advertisement`]s and invalidation travels as
/// [`InvalidationNotice`]s the caller delivers.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    name: NodeId,
    config: RoutingConfig,
    /// Destination -> best entry. Never shrinks; dead routes become unreachable.
    table: BTreeMap<NodeId, RouteEntry>,
    neighbors: BTreeSet<NodeId>,
    /// Neighbor -> tick of its last advertisement.
    last_seen: BTreeMap<NodeId, u64>,
    tick: u64,
    wave_seq: u64,
    waves: WaveLog,
}

impl RoutingTable {
    /// Create a table holding only the self entry, with default config.
    pub fn new(name: impl Into<NodeId>) -> Self {
        Self::build(name.into(), RoutingConfig::default())
    }

    /// Create a table with a custom config.
    pub fn with_config(name: impl Into<NodeId>, config: RoutingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(name.into(), config))
    }

    fn build(name: NodeId, config: RoutingConfig) -> Self {
        let mut table = BTreeMap::new();
        table.insert(name.clone(), RouteEntry::to_self(&name));
        Self {
            name,
            config,
            table,
            neighbors: BTreeSet::new(),
            last_seen: BTreeMap::new(),
            tick: 0,
            wave_seq: 0,
            waves: WaveLog::default(),
        }
    }

    /// This node's name.
    pub fn name(&self) -> &NodeId {
        &self.name
    }

    /// Active configuration.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Logical clock: number of advertisements received so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Known destinations, best route first.
    ///
    /// Ordered by `(hop count, next hop)`; destinations with equal entries
    /// are ordered by name.
    pub fn list_destinations(&self) -> Vec<NodeId> {
        let mut rows: Vec<(&RouteEntry, &NodeId)> =
            self.table.iter().map(|(dest, entry)| (entry, dest)).collect();
        rows.sort();
        rows.into_iter().map(|(_, dest)| dest.clone()).collect()
    }

    /// Hops to `destination`, infinity if unknown.
    pub fn hop_count(&self, destination: &str) -> HopCount {
        self.table
            .get(destination)
            .map_or(HopCount::Infinity, |entry| entry.hop_count)
    }

    /// First node on the path to `destination`, `None` if unreachable.
    pub fn best_link(&self, destination: &str) -> Option<&NodeId> {
        self.table
            .get(destination)
            .and_then(|entry| entry.next_hop.as_ref())
    }

    /// The entry for `destination`, if the destination was ever learned.
    pub fn route(&self, destination: &str) -> Option<&RouteEntry> {
        self.table.get(destination)
    }

    /// All entries, by destination name.
    pub fn routes(&self) -> impl Iterator<Item = (&NodeId, &RouteEntry)> {
        self.table.iter()
    }

    /// Neighbors this node has heard from or been linked to.
    pub fn neighbors(&self) -> impl Iterator<Item = &NodeId> {
        self.neighbors.iter()
    }

    /// Tick at which `neighbor` last advertised, if it is being tracked.
    pub fn last_seen(&self, neighbor: &str) -> Option<u64> {
        self.last_seen.get(neighbor).copied()
    }

    /// Register a direct link before the neighbor has advertised.
    ///
    /// Linked neighbors receive invalidation notices; staleness tracking
    /// starts with their first advertisement.
    pub fn connect(&mut self, neighbor: impl Into<NodeId>) {
        let neighbor = neighbor.into();
        if neighbor != self.name {
            self.neighbors.insert(neighbor);
        }
    }

    /// The advertisement this node sends to its neighbors.
    pub fn advertisement(&self) -> Advertisement {
        let routes = self
            .table
            .iter()
            .map(|(dest, entry)| AdvertisedRoute::from_entry(dest.clone(), entry))
            .collect();
        Advertisement::new(self.name.clone(), routes).with_waves(self.waves.to_vec())
    }

    /// Owned copy of the table for reporting.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            node: self.name.clone(),
            tick: self.tick,
            neighbors: self.neighbors.iter().cloned().collect(),
            routes: self.advertisement().routes,
        }
    }

    /// Apply an advertisement received from a neighbor.
    ///
    /// Advances the tick, refreshes the sender's liveness, declares silent
    /// neighbors stale (wiping the table and starting an invalidation wave
    /// for each), then relaxes every advertised destination: a path through
    /// the sender replaces the local entry when it is no longer than it. On
    /// equal length the most recent advertiser wins.
    ///
    /// An advertisement that predates a wave applied here only contributes
    /// the direct route to its sender.
    pub fn update(&mut self, advertisement: &Advertisement) -> UpdateOutcome {
        let source = &advertisement.sender;
        let mut outcome = UpdateOutcome::default();

        if *source == self.name {
            debug!(node = %self.name, "ignoring own advertisement");
            return outcome;
        }

        self.neighbors.insert(source.clone());
        self.tick += 1;
        self.last_seen.insert(source.clone(), self.tick);

        for applied in &advertisement.waves {
            if !self.waves.is_new(&applied.wave) {
                continue;
            }
            debug!(
                node = %self.name,
                from = %source,
                origin = %applied.wave.origin,
                seq = applied.wave.seq,
                "catching up on missed invalidation"
            );
            self.waves.admit(&applied.wave, &applied.failed);
            let notice = InvalidationNotice {
                wave: applied.wave.clone(),
                failed: applied.failed.clone(),
                visited: BTreeSet::from([source.clone()]),
            };
            outcome.notices.extend(self.apply_wave(notice));
            outcome.caught_up.push(applied.wave.clone());
        }

        let (tick, threshold) = (self.tick, self.config.stale_threshold);
        let stale: Vec<NodeId> = self
            .last_seen
            .iter()
            .filter(|&(_, &seen)| tick - seen >= threshold)
            .map(|(neighbor, _)| neighbor.clone())
            .collect();

        for neighbor in stale {
            warn!(
                node = %self.name,
                neighbor = %neighbor,
                tick = self.tick,
                "neighbor stale, invalidating routes"
            );
            // Tracking resumes when the neighbor advertises again.
            self.last_seen.remove(&neighbor);
            self.table.insert(neighbor.clone(), RouteEntry::UNREACHABLE);
            let notices = self.start_invalidation(neighbor.clone());
            outcome.notices.extend(notices);
            outcome.stale.push(neighbor);
        }

        let current = self.waves.covered_by(&advertisement.waves);
        if !current {
            debug!(node = %self.name, from = %source, "advertisement predates a wipe");
        }

        for route in &advertisement.routes {
            if !route.hop_count.is_finite() || (!current && route.destination != *source) {
                continue;
            }
            let candidate = route.hop_count.via_neighbor();
            if !candidate.is_finite() || self.hop_count(route.destination.as_str()) < candidate {
                continue;
            }
            let entry = RouteEntry::new(candidate, source.clone());
            if self.table.insert(route.destination.clone(), entry.clone()) != Some(entry) {
                outcome.changed.push(route.destination.clone());
            }
        }

        outcome
    }

    /// Start an invalidation wave for `failed` at this node.
    ///
    /// Wipes the local table and returns the notices for every neighbor.
    pub fn start_invalidation(&mut self, failed: NodeId) -> Vec<OutboundNotice> {
        self.wave_seq += 1;
        let wave = WaveId {
            origin: self.name.clone(),
            seq: self.wave_seq,
        };
        self.waves.admit(&wave, &failed);
        self.apply_wave(InvalidationNotice {
            wave,
            failed,
            visited: BTreeSet::new(),
        })
    }

    /// Apply an invalidation notice from a neighbor.
    ///
    /// A wave is applied once per node; repeats and older waves from the same
    /// origin are dropped.
    pub fn invalidate(&mut self, notice: InvalidationNotice) -> InvalidationOutcome {
        if !self.waves.admit(&notice.wave, &notice.failed) {
            debug!(
                node = %self.name,
                origin = %notice.wave.origin,
                seq = notice.wave.seq,
                "dropping repeated invalidation"
            );
            return InvalidationOutcome::default();
        }
        InvalidationOutcome {
            applied: true,
            forward: self.apply_wave(notice),
        }
    }

    fn apply_wave(&mut self, notice: InvalidationNotice) -> Vec<OutboundNotice> {
        debug!(
            node = %self.name,
            failed = %notice.failed,
            origin = %notice.wave.origin,
            "wiping routing table"
        );
        self.wipe();

        let InvalidationNotice {
            wave,
            failed,
            mut visited,
        } = notice;
        visited.insert(self.name.clone());

        let targets: Vec<NodeId> = self
            .neighbors
            .iter()
            .filter(|n| !visited.contains(*n))
            .cloned()
            .collect();
        visited.extend(targets.iter().cloned());

        targets
            .into_iter()
            .map(|to| {
                let notice = InvalidationNotice {
                    wave: wave.clone(),
                    failed: failed.clone(),
                    visited: visited.clone(),
                };
                (to, notice)
            })
            .collect()
    }

    /// Reset every entry to unreachable, keeping the self entry.
    fn wipe(&mut self) {
        for entry in self.table.values_mut() {
            *entry = RouteEntry::UNREACHABLE;
        }
        self.table.insert(self.name.clone(), RouteEntry::to_self(&self.name));
    }
}

/// Owned view of a routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Node owning the table.
    pub node: NodeId,
    /// Tick at the time of the snapshot.
    pub tick: u64,
    /// Known neighbors.
    pub neighbors: Vec<NodeId>,
    /// Entries by destination name.
    pub routes: Vec<AdvertisedRoute>,
}

impl TableSnapshot {
    /// Hops to `destination`, infinity if unknown.
    pub fn hop_count(&self, destination: &str) -> HopCount {
        self.find(destination).map_or(HopCount::Infinity, |r| r.hop_count)
    }

    /// Next hop toward `destination`.
    pub fn best_link(&self, destination: &str) -> Option<&NodeId> {
        self.find(destination).and_then(|r| r.next_hop.as_ref())
    }

    fn find(&self, destination: &str) -> Option<&AdvertisedRoute> {
        self.routes.iter().find(|r| r.destination == *destination)
    }
}
