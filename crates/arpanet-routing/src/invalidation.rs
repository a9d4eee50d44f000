//! Invalidation waves.
//!
//! When a node declares a neighbor stale it wipes its own table and starts a
//! wave: an [`InvalidationNotice`] sent to each neighbor, which wipes in turn
//! and forwards the notice to its own neighbors. The notice carries the set of
//! nodes already reached, and every node remembers the newest wave it applied
//! per origin, so a wave visits each node of a cyclic graph at most once.
//! Independent failures start new waves and propagate again.
//!
//! Advertisements carry the sender's applied waves. A receiver that has
//! applied a wave the sender has not discards the advertisement's routes (they
//! were computed before the wipe); a receiver that missed a wave the sender
//! applied catches up by applying it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entry::NodeId;

/// Identity of one invalidation wave.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WaveId {
    /// Node that detected the failure.
    pub origin: NodeId,
    /// Per-origin sequence number, starting at 1.
    pub seq: u64,
}

/// Instruction to wipe the routing table, travelling through the neighbor graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationNotice {
    /// Wave this notice belongs to.
    pub wave: WaveId,
    /// The neighbor whose staleness started the wave.
    pub failed: NodeId,
    /// Nodes already wiped or already notified in this wave.
    pub visited: BTreeSet<NodeId>,
}

impl InvalidationNotice {
    /// Whether `node` has been reached by this wave.
    pub fn has_visited(&self, node: &str) -> bool {
        self.visited.contains(node)
    }
}

/// A wave a node has applied, as listed in its advertisements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedWave {
    /// The wave.
    pub wave: WaveId,
    /// The neighbor whose staleness started it.
    pub failed: NodeId,
}

/// Newest wave applied per origin.
#[derive(Debug, Clone, Default)]
pub(crate) struct WaveLog {
    applied: BTreeMap<NodeId, AppliedWave>,
}

impl WaveLog {
    /// Whether `wave` is newer than anything applied from its origin.
    pub(crate) fn is_new(&self, wave: &WaveId) -> bool {
        self.applied
            .get(&wave.origin)
            .map_or(true, |applied| applied.wave.seq < wave.seq)
    }

    /// Record a wave. Returns false if it, or a newer wave from the same
    /// origin, was already applied.
    pub(crate) fn admit(&mut self, wave: &WaveId, failed: &NodeId) -> bool {
        if !self.is_new(wave) {
            return false;
        }
        let applied = AppliedWave {
            wave: wave.clone(),
            failed: failed.clone(),
        };
        self.applied.insert(wave.origin.clone(), applied);
        true
    }

    /// Whether a node advertising `theirs` has applied every wave applied here.
    pub(crate) fn covered_by(&self, theirs: &[AppliedWave]) -> bool {
        self.applied.values().all(|mine| {
            theirs
                .iter()
                .any(|t| t.wave.origin == mine.wave.origin && t.wave.seq >= mine.wave.seq)
        })
    }

    /// Applied waves, by origin.
    pub(crate) fn to_vec(&self) -> Vec<AppliedWave> {
        self.applied.values().cloned().collect()
    }
}
