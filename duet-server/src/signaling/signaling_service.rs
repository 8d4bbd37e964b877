use crate::config::ServerConfig;
use crate::error::SignalingError;
use crate::registry::Registry;
use crate::signaling::{ConnectionTable, Relay, SignalingOutput};
use duet_core::{ClientMessage, ConnectionId, Profile, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Everything a socket handler needs: the live connections, the registry and
/// the relay built on top of them. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    connections: ConnectionTable,
    registry: Registry,
    relay: Relay,
    config: Arc<ServerConfig>,
}

impl SignalingService {
    pub fn new(config: ServerConfig) -> Self {
        let connections = ConnectionTable::new();
        let output: Arc<dyn SignalingOutput> = Arc::new(connections.clone());
        let registry = Registry::new(&config, output.clone());
        let relay = Relay::new(registry.clone(), output);

        Self {
            connections,
            registry,
            relay,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Registers a new transport connection and greets it with its id.
    /// The returned receiver is the connection's outbound queue.
    pub fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let peer_id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let _ = tx.send(ServerMessage::Welcome { id: peer_id });
        self.connections.add_peer(peer_id, tx);

        info!("Connection {:?} established", peer_id);
        (peer_id, rx)
    }

    /// Forgets a connection. A joined connection leaves its room first, so
    /// the other member hears about it.
    pub async fn disconnect(&self, peer_id: ConnectionId) {
        match self.registry.leave(peer_id).await {
            Ok(membership) => info!(
                "Connection {:?} dropped out of room '{}'",
                peer_id, membership.room
            ),
            Err(SignalingError::NotJoined(_)) => {}
            Err(e) => warn!("Leave on disconnect failed for {:?}: {}", peer_id, e),
        }

        self.connections.remove_peer(&peer_id);
        info!("Connection {:?} closed", peer_id);
    }

    pub async fn handle_message(
        &self,
        from: ConnectionId,
        msg: ClientMessage,
    ) -> Result<(), SignalingError> {
        match msg {
            ClientMessage::RoomJoin { email, room, name } => {
                info!("Peer {:?} wants to join room '{}'", from, room);
                let result = self
                    .registry
                    .join(from, room, Profile::new(email, name))
                    .await
                    .map(|_| ());
                self.report_failure(from, result).await
            }

            ClientMessage::RoomLeave {} => {
                let result = self.registry.leave(from).await.map(|_| ());
                self.report_failure(from, result).await
            }

            relayable => {
                let Some(to) = relayable.target() else {
                    return Ok(());
                };
                let Some(relayed) = ServerMessage::relayed(from, relayable) else {
                    return Ok(());
                };
                self.relay.relay(from, to, relayed).await
            }
        }
    }

    async fn report_failure(
        &self,
        from: ConnectionId,
        result: Result<(), SignalingError>,
    ) -> Result<(), SignalingError> {
        if let Err(e) = &result {
            warn!("Rejected request from {:?}: {}", from, e);
            self.relay.report(from, e).await;
        }
        result
    }
}
