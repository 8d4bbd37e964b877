use crate::error::SignalingError;
use async_trait::async_trait;
use duet_core::{ConnectionId, PeerInfo, RoomId, ServerMessage};

/// Outbound side of the signaling transport. Rooms and the relay talk to
/// clients only through this trait, so tests can capture what would go on the
/// wire.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver one message to a live connection.
    async fn deliver(&self, to: ConnectionId, msg: ServerMessage) -> Result<(), SignalingError>;

    /// Acknowledge a join to the joiner.
    async fn send_join_ack(
        &self,
        to: ConnectionId,
        room: &RoomId,
        joiner: &PeerInfo,
        peers: Vec<PeerInfo>,
    ) -> Result<(), SignalingError> {
        let msg = ServerMessage::RoomJoin {
            email: joiner.email.clone(),
            room: room.clone(),
            name: joiner.name.clone(),
            peers,
        };
        self.deliver(to, msg).await
    }

    /// Tell an existing member that someone joined.
    async fn send_user_joined(
        &self,
        to: ConnectionId,
        joiner: &PeerInfo,
    ) -> Result<(), SignalingError> {
        let msg = ServerMessage::UserJoined {
            email: joiner.email.clone(),
            id: joiner.id,
            name: joiner.name.clone(),
        };
        self.deliver(to, msg).await
    }

    /// Tell a remaining member that someone left.
    async fn send_user_left(
        &self,
        to: ConnectionId,
        departed: ConnectionId,
    ) -> Result<(), SignalingError> {
        self.deliver(to, ServerMessage::UserLeft { id: departed })
            .await
    }
}
