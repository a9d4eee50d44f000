//! Messages between node actors, and the handle used to send them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arpanet_routing::{Advertisement, InvalidationNotice, NodeId, RouteEntry, TableSnapshot};
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::warn;

use crate::error::{Error, Result};

/// Message delivered to a node's inbox.
#[derive(Debug)]
pub enum NodeMessage {
    /// A neighbor's routing table.
    Advertise(Advertisement),
    /// An invalidation wave passing through.
    Invalidate(InvalidationNotice),
    /// Send our advertisement to every link.
    Broadcast { round: u64 },
    /// Look up one route.
    Route {
        destination: NodeId,
        reply: oneshot::Sender<RouteEntry>,
    },
    /// Copy the whole table.
    Snapshot { reply: oneshot::Sender<TableSnapshot> },
    /// Stop (or resume) sending and receiving routing traffic.
    SetSilent(bool),
    /// Stop the actor.
    Shutdown,
}

impl NodeMessage {
    fn kind(&self) -> &'static str {
        match self {
            NodeMessage::Advertise(_) => "advertise",
            NodeMessage::Invalidate(_) => "invalidate",
            NodeMessage::Broadcast { .. } => "broadcast",
            NodeMessage::Route { .. } => "route",
            NodeMessage::Snapshot { .. } => "snapshot",
            NodeMessage::SetSilent(_) => "set_silent",
            NodeMessage::Shutdown => "shutdown",
        }
    }
}

/// Count of messages sent but not yet handled, across a whole network.
///
/// Every send calls [`Inflight::begin`] first and the receiving actor calls
/// [`Inflight::end`] once the message is handled, so a count of zero means
/// every message and everything it caused has been processed.
#[derive(Debug, Clone, Default)]
pub struct Inflight {
    inner: Arc<InflightInner>,
}

#[derive(Debug, Default)]
struct InflightInner {
    count: AtomicUsize,
    idle: Notify,
}

impl Inflight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) {
        self.inner.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end(&self) {
        if self.inner.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }

    /// Messages currently in flight.
    pub fn pending(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    /// Wait until nothing is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Cloneable sender for one node's inbox.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    id: NodeId,
    tx: mpsc::Sender<NodeMessage>,
    inflight: Inflight,
}

impl NodeHandle {
    pub(crate) fn new(id: NodeId, tx: mpsc::Sender<NodeMessage>, inflight: Inflight) -> Self {
        Self { id, tx, inflight }
    }

    /// Name of the node behind this handle.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Deliver without waiting. A message to a full or closed inbox is dropped.
    ///
    /// Used between actors so no actor ever waits on another.
    pub fn try_deliver(&self, message: NodeMessage) -> bool {
        self.inflight.begin();
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(e) => {
                self.inflight.end();
                let reason = match &e {
                    mpsc::error::TrySendError::Full(_) => "inbox full",
                    mpsc::error::TrySendError::Closed(_) => "inbox closed",
                };
                warn!(node = %self.id, kind = e.into_inner().kind(), reason, "dropping message");
                false
            }
        }
    }

    /// Deliver, waiting for inbox capacity.
    pub async fn send(&self, message: NodeMessage) -> Result<()> {
        self.inflight.begin();
        if self.tx.send(message).await.is_err() {
            self.inflight.end();
            return Err(Error::NodeStopped(self.id.clone()));
        }
        Ok(())
    }

    /// Ask the node for its route to `destination`.
    pub async fn route(&self, destination: &str) -> Result<RouteEntry> {
        let (reply, rx) = oneshot::channel();
        self.send(NodeMessage::Route {
            destination: NodeId::from(destination),
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::NodeStopped(self.id.clone()))
    }

    /// Ask the node for a copy of its table.
    pub async fn snapshot(&self) -> Result<TableSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(NodeMessage::Snapshot { reply }).await?;
        rx.await.map_err(|_| Error::NodeStopped(self.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_idle_returns_when_nothing_is_pending() {
        let inflight = Inflight::new();
        tokio::time::timeout(Duration::from_secs(1), inflight.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_idle_wakes_on_last_end() {
        let inflight = Inflight::new();
        inflight.begin();
        inflight.begin();

        let waiter = {
            let inflight = inflight.clone();
            tokio::spawn(async move { inflight.wait_idle().await })
        };

        inflight.end();
        assert_eq!(inflight.pending(), 1);
        inflight.end();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn full_inbox_drops_instead_of_waiting() {
        let (tx, mut rx) = mpsc::channel(1);
        let inflight = Inflight::new();
        let handle = NodeHandle::new(NodeId::from("MIT"), tx, inflight.clone());

        assert!(handle.try_deliver(NodeMessage::SetSilent(true)));
        assert!(!handle.try_deliver(NodeMessage::SetSilent(false)));
        assert_eq!(inflight.pending(), 1);

        assert!(matches!(rx.recv().await, Some(NodeMessage::SetSilent(true))));
    }

    #[tokio::test]
    async fn send_to_closed_inbox_is_node_stopped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let inflight = Inflight::new();
        let handle = NodeHandle::new(NodeId::from("MIT"), tx, inflight.clone());

        let err = handle.send(NodeMessage::Shutdown).await.unwrap_err();
        assert!(matches!(err, Error::NodeStopped(id) if id == "MIT"));
        assert_eq!(inflight.pending(), 0);
    }
}
