use crate::error::SignalingError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use duet_core::{ConnectionId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Live transport connections, keyed by the id assigned on connect.
///
/// Each entry is the outbound queue of one socket; the socket's send task
/// serializes whatever lands there.
#[derive(Clone, Default)]
pub struct ConnectionTable {
    peers: Arc<DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&self, peer_id: ConnectionId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.peers.insert(peer_id, tx);
    }

    pub fn remove_peer(&self, peer_id: &ConnectionId) {
        self.peers.remove(peer_id);
    }

    pub fn contains(&self, peer_id: &ConnectionId) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn send_signal(&self, peer_id: ConnectionId, msg: ServerMessage) -> Result<(), SignalingError> {
        let Some(peer) = self.peers.get(&peer_id) else {
            warn!(
                "Attempted to send {} to disconnected user {:?}",
                msg.type_tag(),
                peer_id
            );
            return Err(SignalingError::UnknownRelayTarget(peer_id));
        };

        peer.send(msg)
            .map_err(|_| SignalingError::UnknownRelayTarget(peer_id))
    }
}

#[async_trait]
impl SignalingOutput for ConnectionTable {
    async fn deliver(&self, to: ConnectionId, msg: ServerMessage) -> Result<(), SignalingError> {
        self.send_signal(to, msg)
    }
}
