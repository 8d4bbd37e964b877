use crate::config::ServerConfig;
use crate::error::SignalingError;
use crate::registry::{Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use duet_core::{ConnectionId, PeerInfo, Profile, RoomId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// A room can shut down between us looking up its sender and our command
/// arriving. Retrying spawns a fresh room.
const ROOM_DISPATCH_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room: RoomId,
    pub profile: Profile,
}

/// Session registry: which connection sits in which room, under which profile.
///
/// The index of connections is shared; each room's membership is owned by its
/// own [`Room`] task.
#[derive(Clone)]
pub struct Registry {
    rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    members: Arc<DashMap<ConnectionId, Membership>>,
    signaling: Arc<dyn SignalingOutput>,
    room_capacity: usize,
    room_command_buffer: usize,
}

impl Registry {
    pub fn new(config: &ServerConfig, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            members: Arc::new(DashMap::new()),
            signaling,
            room_capacity: config.room_capacity.max(1),
            room_command_buffer: config.room_command_buffer.max(1),
        }
    }

    /// Registers `peer_id` in `room` and returns the members that were there
    /// before it. Every one of them is sent `user:joined`.
    pub async fn join(
        &self,
        peer_id: ConnectionId,
        room: RoomId,
        profile: Profile,
    ) -> Result<Vec<PeerInfo>, SignalingError> {
        match self.members.entry(peer_id) {
            Entry::Occupied(_) => return Err(SignalingError::AlreadyJoined(peer_id)),
            Entry::Vacant(slot) => {
                slot.insert(Membership {
                    room: room.clone(),
                    profile: profile.clone(),
                });
            }
        }

        let peer = PeerInfo::new(peer_id, &profile);
        let result = self.dispatch_join(&room, peer).await;

        if result.is_err() {
            self.members.remove(&peer_id);
        }

        result
    }

    /// Removes `peer_id` from its room. Remaining members are sent
    /// `user:left`.
    pub async fn leave(&self, peer_id: ConnectionId) -> Result<Membership, SignalingError> {
        let Some((_, membership)) = self.members.remove(&peer_id) else {
            return Err(SignalingError::NotJoined(peer_id));
        };

        let sender = self.rooms.get(&membership.room).map(|s| s.clone());
        if let Some(sender) = sender {
            let (reply_tx, reply_rx) = oneshot::channel();
            let cmd = RoomCommand::Leave {
                peer_id,
                reply: reply_tx,
            };
            if sender.send(cmd).await.is_ok() {
                let _ = reply_rx.await;
            }
        }

        Ok(membership)
    }

    pub fn lookup(&self, peer_id: &ConnectionId) -> Option<Membership> {
        self.members.get(peer_id).map(|m| m.clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    async fn dispatch_join(
        &self,
        room: &RoomId,
        peer: PeerInfo,
    ) -> Result<Vec<PeerInfo>, SignalingError> {
        for _ in 0..ROOM_DISPATCH_ATTEMPTS {
            let sender = self.get_room_sender(room);
            let (reply_tx, reply_rx) = oneshot::channel();
            let cmd = RoomCommand::Join {
                peer: peer.clone(),
                reply: reply_tx,
            };

            if sender.send(cmd).await.is_err() {
                debug!("Room '{}' closed before join, retrying", room);
                self.forget_room(room, &sender);
                continue;
            }

            match reply_rx.await {
                Ok(result) => return result,
                Err(_) => {
                    debug!("Room '{}' dropped a join, retrying", room);
                    self.forget_room(room, &sender);
                }
            }
        }

        Err(SignalingError::RoomUnavailable(room.clone()))
    }

    fn get_room_sender(&self, room: &RoomId) -> mpsc::Sender<RoomCommand> {
        self.rooms
            .entry(room.clone())
            .or_insert_with(|| self.spawn_room(room))
            .clone()
    }

    fn spawn_room(&self, room: &RoomId) -> mpsc::Sender<RoomCommand> {
        info!("Creating new room: {}", room);
        let (tx, rx) = mpsc::channel(self.room_command_buffer);

        let actor = Room::new(
            room.clone(),
            self.room_capacity,
            rx,
            self.signaling.clone(),
        );

        let rooms = self.rooms.clone();
        let key = room.clone();
        let own_tx = tx.clone();
        tokio::spawn(async move {
            actor.run().await;
            rooms.remove_if(&key, |_, tx| tx.same_channel(&own_tx));
        });

        tx
    }

    fn forget_room(&self, room: &RoomId, sender: &mpsc::Sender<RoomCommand>) {
        self.rooms.remove_if(room, |_, tx| tx.same_channel(sender));
    }
}
