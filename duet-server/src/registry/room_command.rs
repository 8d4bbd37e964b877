use crate::error::SignalingError;
use duet_core::{ConnectionId, PeerInfo};
use tokio::sync::oneshot;

/// Commands a room actor accepts from the registry.
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a member. Replies with the members that were already present.
    Join {
        peer: PeerInfo,
        reply: oneshot::Sender<Result<Vec<PeerInfo>, SignalingError>>,
    },

    /// Remove a member. Replies `true` if it was present.
    Leave {
        peer_id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
}
