use crate::error::SignalingError;
use crate::registry::room_command::RoomCommand;
use crate::signaling::SignalingOutput;
use duet_core::{ConnectionId, PeerInfo, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// One room's event loop. All joins and leaves for a room go through this
/// task, so membership changes and the notifications they cause are applied in
/// a single order.
pub struct Room {
    id: RoomId,
    capacity: usize,
    members: Vec<PeerInfo>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

enum RoomFlow {
    Continue,
    Empty,
}

impl Room {
    pub fn new(
        id: RoomId,
        capacity: usize,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            id,
            capacity: capacity.max(1),
            members: Vec::new(),
            command_rx,
            signaling,
        }
    }

    /// Runs until the last member leaves or every sender is dropped.
    pub async fn run(mut self) {
        info!("Room '{}' event loop started", self.id);

        while let Some(cmd) = self.command_rx.recv().await {
            if let RoomFlow::Empty = self.handle_command(cmd).await {
                info!("Room '{}' is empty. Shutting down room.", self.id);
                break;
            }
        }

        info!("Room '{}' event loop finished", self.id);
    }

    async fn handle_command(&mut self, cmd: RoomCommand) -> RoomFlow {
        match cmd {
            RoomCommand::Join { peer, reply } => {
                let result = self.join(peer).await;
                if reply.send(result).is_err() {
                    warn!("Join requester for room '{}' went away", self.id);
                }
                RoomFlow::Continue
            }

            RoomCommand::Leave { peer_id, reply } => {
                let removed = self.leave(peer_id).await;
                let _ = reply.send(removed);

                if removed && self.members.is_empty() {
                    RoomFlow::Empty
                } else {
                    RoomFlow::Continue
                }
            }
        }
    }

    async fn join(&mut self, peer: PeerInfo) -> Result<Vec<PeerInfo>, SignalingError> {
        if self.members.iter().any(|m| m.id == peer.id) {
            return Err(SignalingError::AlreadyJoined(peer.id));
        }

        if self.members.len() >= self.capacity {
            warn!(
                "Rejecting {:?} from room '{}': {} of {} seats taken",
                peer.id,
                self.id,
                self.members.len(),
                self.capacity
            );
            return Err(SignalingError::RoomFull {
                room: self.id.clone(),
                capacity: self.capacity,
            });
        }

        let existing = self.members.clone();

        if let Err(e) = self
            .signaling
            .send_join_ack(peer.id, &self.id, &peer, existing.clone())
            .await
        {
            error!("Failed to acknowledge join for {:?}: {}", peer.id, e);
        }

        for member in &existing {
            if let Err(e) = self.signaling.send_user_joined(member.id, &peer).await {
                error!("Failed to announce {:?} to {:?}: {}", peer.id, member.id, e);
            }
        }

        info!(
            "User {:?} ({}) joined room '{}' with {} member(s) present",
            peer.id,
            peer.name,
            self.id,
            existing.len()
        );
        self.members.push(peer);

        Ok(existing)
    }

    async fn leave(&mut self, peer_id: ConnectionId) -> bool {
        let Some(pos) = self.members.iter().position(|m| m.id == peer_id) else {
            return false;
        };
        self.members.remove(pos);

        info!("User {:?} left room '{}'", peer_id, self.id);

        for member in &self.members {
            if let Err(e) = self.signaling.send_user_left(member.id, peer_id).await {
                error!("Failed to announce departure to {:?}: {}", member.id, e);
            }
        }

        true
    }
}
