//! One routing node as a tokio task.

use std::collections::BTreeMap;

use arpanet_routing::{NodeId, OutboundNotice, RoutingTable};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::{update_events, RoutingEvent};
use crate::message::{Inflight, NodeHandle, NodeMessage};

/// Task state for one node. Owns its routing table exclusively.
pub struct NodeActor {
    table: RoutingTable,
    links: BTreeMap<NodeId, NodeHandle>,
    inbox: mpsc::Receiver<NodeMessage>,
    inflight: Inflight,
    events: mpsc::UnboundedSender<RoutingEvent>,
    silent: bool,
    round: u64,
}

impl NodeActor {
    pub fn new(
        table: RoutingTable,
        links: BTreeMap<NodeId, NodeHandle>,
        inbox: mpsc::Receiver<NodeMessage>,
        inflight: Inflight,
        events: mpsc::UnboundedSender<RoutingEvent>,
    ) -> Self {
        Self {
            table,
            links,
            inbox,
            inflight,
            events,
            silent: false,
            round: 0,
        }
    }

    /// Handle messages until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        debug!(node = %self.table.name(), links = self.links.len(), "node started");

        while let Some(message) = self.inbox.recv().await {
            let keep_running = self.handle(message);
            self.inflight.end();
            if !keep_running {
                break;
            }
        }

        // Anything still queued will never be handled.
        self.inbox.close();
        while self.inbox.try_recv().is_ok() {
            self.inflight.end();
        }
        debug!(node = %self.table.name(), tick = self.table.tick(), "node stopped");
    }

    fn handle(&mut self, message: NodeMessage) -> bool {
        match message {
            NodeMessage::Advertise(advertisement) => {
                if self.silent {
                    self.dropped();
                    return true;
                }
                let outcome = self.table.update(&advertisement);
                for event in update_events(&self.table, &outcome, self.round) {
                    self.emit(event);
                }
                self.forward(outcome.notices);
            }
            NodeMessage::Invalidate(notice) => {
                if self.silent {
                    self.dropped();
                    return true;
                }
                let wave = notice.wave.clone();
                let outcome = self.table.invalidate(notice);
                if outcome.applied {
                    self.emit(RoutingEvent::TableWiped {
                        node: self.table.name().clone(),
                        wave,
                        round: self.round,
                    });
                }
                self.forward(outcome.forward);
            }
            NodeMessage::Broadcast { round } => {
                self.round = round;
                if !self.silent {
                    self.broadcast();
                }
            }
            NodeMessage::Route { destination, reply } => {
                let entry = self.table.route(destination.as_str()).cloned().unwrap_or_default();
                let _ = reply.send(entry);
            }
            NodeMessage::Snapshot { reply } => {
                let _ = reply.send(self.table.snapshot());
            }
            NodeMessage::SetSilent(silent) => {
                if silent != self.silent {
                    info!(node = %self.table.name(), silent, "changing silence");
                }
                self.silent = silent;
            }
            NodeMessage::Shutdown => return false,
        }
        true
    }

    fn broadcast(&self) {
        let advertisement = self.table.advertisement();
        for (neighbor, link) in &self.links {
            self.emit(RoutingEvent::AdvertisementSent {
                from: self.table.name().clone(),
                to: neighbor.clone(),
                routes: advertisement.routes.len(),
                round: self.round,
            });
            link.try_deliver(NodeMessage::Advertise(advertisement.clone()));
        }
    }

    fn forward(&self, notices: Vec<OutboundNotice>) {
        for (next, notice) in notices {
            match self.links.get(&next) {
                Some(link) => {
                    link.try_deliver(NodeMessage::Invalidate(notice));
                }
                None => warn!(node = %self.table.name(), next = %next, "no link for invalidation"),
            }
        }
    }

    fn dropped(&self) {
        self.emit(RoutingEvent::MessageDropped {
            node: self.table.name().clone(),
            round: self.round,
        });
    }

    fn emit(&self, event: RoutingEvent) {
        // The receiver only goes away when the network is being torn down.
        let _ = self.events.send(event);
    }
}
