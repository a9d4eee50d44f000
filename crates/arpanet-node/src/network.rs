//! A network of node actors wired along a topology.

use std::collections::BTreeMap;
use std::time::Duration;

use arpanet_routing::{NodeId, RouteEntry, RoutingConfig, RoutingTable, TableSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::actor::NodeActor;
use crate::error::{Error, Result};
use crate::events::RoutingEvent;
use crate::message::{Inflight, NodeHandle, NodeMessage};
use crate::topology::Topology;

/// Running node actors and the means to drive them.
///
/// Must be created inside a tokio runtime.
pub struct Network {
    topology: Topology,
    handles: BTreeMap<NodeId, NodeHandle>,
    tasks: Vec<JoinHandle<()>>,
    inflight: Inflight,
    events: mpsc::UnboundedReceiver<RoutingEvent>,
    round: u64,
}

impl Network {
    /// Spawn one actor per node of `topology`, each linked to its neighbors.
    pub fn spawn(topology: Topology, config: RoutingConfig, inbox_capacity: usize) -> Result<Self> {
        config.validate()?;
        if inbox_capacity == 0 {
            return Err(Error::InvalidConfig("inbox_capacity must be at least 1".to_string()));
        }

        let inflight = Inflight::new();
        let (events_tx, events) = mpsc::unbounded_channel();

        let mut handles = BTreeMap::new();
        let mut inboxes = Vec::new();
        for node in topology.nodes() {
            let (tx, rx) = mpsc::channel(inbox_capacity);
            handles.insert(node.clone(), NodeHandle::new(node.clone(), tx, inflight.clone()));
            inboxes.push((node.clone(), rx));
        }

        let mut tasks = Vec::with_capacity(inboxes.len());
        for (node, inbox) in inboxes {
            let mut table = RoutingTable::with_config(node.clone(), config)?;
            let mut links = BTreeMap::new();
            for neighbor in topology.neighbors(node.as_str()) {
                table.connect(neighbor.clone());
                if let Some(handle) = handles.get(neighbor) {
                    links.insert(neighbor.clone(), handle.clone());
                }
            }
            let actor = NodeActor::new(table, links, inbox, inflight.clone(), events_tx.clone());
            tasks.push(tokio::spawn(actor.run()));
        }

        info!(nodes = handles.len(), "network started");
        Ok(Self {
            topology,
            handles,
            tasks,
            inflight,
            events,
            round: 0,
        })
    }

    /// The topology the actors were wired from.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Rounds broadcast so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Handle for one node.
    pub fn handle(&self, node: &str) -> Result<&NodeHandle> {
        self.handles
            .get(node)
            .ok_or_else(|| Error::UnknownNode(NodeId::from(node)))
    }

    /// Every node tells its neighbors its table; returns once everything that
    /// caused has been handled.
    pub async fn broadcast_round(&mut self) -> Result<()> {
        self.round += 1;
        for handle in self.handles.values() {
            handle.send(NodeMessage::Broadcast { round: self.round }).await?;
        }
        self.settle().await;
        debug!(round = self.round, "round complete");
        Ok(())
    }

    /// Run `rounds` broadcast rounds back to back.
    pub async fn run_rounds(&mut self, rounds: usize) -> Result<()> {
        for _ in 0..rounds {
            self.broadcast_round().await?;
        }
        Ok(())
    }

    /// Wait until no message is in flight.
    pub async fn settle(&self) {
        self.inflight.wait_idle().await;
    }

    /// Make `node` stop sending and receiving routing traffic.
    pub async fn silence(&self, node: &str) -> Result<()> {
        self.handle(node)?.send(NodeMessage::SetSilent(true)).await?;
        self.settle().await;
        Ok(())
    }

    /// Undo [`Network::silence`].
    pub async fn revive(&self, node: &str) -> Result<()> {
        self.handle(node)?.send(NodeMessage::SetSilent(false)).await?;
        self.settle().await;
        Ok(())
    }

    /// `node`'s current route to `destination`.
    pub async fn route(&self, node: &str, destination: &str) -> Result<RouteEntry> {
        self.handle(node)?.route(destination).await
    }

    /// Copy of `node`'s table.
    pub async fn snapshot(&self, node: &str) -> Result<TableSnapshot> {
        self.handle(node)?.snapshot().await
    }

    /// Copies of every node's table, by node name.
    pub async fn snapshots(&self) -> Result<Vec<TableSnapshot>> {
        let mut snapshots = Vec::with_capacity(self.handles.len());
        for handle in self.handles.values() {
            snapshots.push(handle.snapshot().await?);
        }
        Ok(snapshots)
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<RoutingEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Stop every actor and wait for the tasks to finish.
    pub async fn shutdown(self) -> Result<()> {
        for handle in self.handles.values() {
            // A node that already stopped has nothing left to shut down.
            let _ = handle.send(NodeMessage::Shutdown).await;
        }
        for task in self.tasks {
            task.await?;
        }
        info!(rounds = self.round, "network stopped");
        Ok(())
    }
}

/// Drive `network` with one round every `period`, `rounds` times, then hand
/// it back.
pub fn spawn_scheduler(
    mut network: Network,
    period: Duration,
    rounds: usize,
) -> JoinHandle<Result<Network>> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        for _ in 0..rounds {
            interval.tick().await;
            network.broadcast_round().await?;
        }
        Ok(network)
    })
}
