use crate::call::{CallCommand, CallController, CallEvent, HangupReason};
use crate::engine::{EngineEvent, EngineFactory, LocalTrackOf, RemoteTrackOf};
use crate::error::CallError;
use crate::media::MediaDevices;
use duet_core::{PeerInfo, RelayErrorKind, ServerMessage};
use tracing::{debug, info, warn};

impl<F, D> CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    pub async fn handle_server_message(&mut self, msg: ServerMessage) -> Result<(), CallError> {
        debug!("Signaling in: {}", msg.type_tag());

        match msg {
            ServerMessage::Welcome { id } => {
                info!("Server assigned id {:?}", id);
                self.local_id = Some(id);
                self.emit(CallEvent::Connected { id });
            }

            ServerMessage::RoomJoin { room, peers, .. } => {
                info!("Joined room '{}' with {} other member(s)", room, peers.len());
                self.room = Some(room.clone());
                self.peers = peers.clone();
                self.emit(CallEvent::Joined { room, peers });
            }

            ServerMessage::UserJoined { email, id, name } => {
                info!("{} ({:?}) joined the room", name, id);
                let peer = PeerInfo { id, email, name };
                if !self.peers.iter().any(|p| p.id == id) {
                    self.peers.push(peer.clone());
                }
                self.emit(CallEvent::PeerJoined(peer));
            }

            ServerMessage::UserLeft { id } => {
                info!("{:?} left the room", id);
                self.peers.retain(|p| p.id != id);
                self.emit(CallEvent::PeerLeft(id));

                if self.pending_invite.as_ref().is_some_and(|i| i.from == id) {
                    self.pending_invite = None;
                    self.deadline = None;
                }
                if self.remote_peer() == Some(id) {
                    self.end_call(HangupReason::PeerLeft).await;
                }
            }

            ServerMessage::IncomingCall { from, offer, name } => {
                self.on_incoming_call(from, offer, name).await?;
            }

            ServerMessage::CallAccepted { from, ans } => {
                self.on_answer_received(from, ans).await?;
            }

            ServerMessage::NegoNeeded { from, offer } => {
                self.on_renegotiation_offer(from, offer).await?;
            }

            ServerMessage::NegoFinal { ans, from } => {
                self.on_renegotiation_answer(from, ans).await?;
            }

            ServerMessage::CallEnded { from } => {
                if self.pending_invite.as_ref().is_some_and(|i| i.from == from) {
                    info!("{:?} withdrew the call", from);
                    self.pending_invite = None;
                    self.deadline = None;
                } else if self.remote_peer() == Some(from) {
                    self.end_call(HangupReason::Remote).await;
                } else {
                    return Err(CallError::StaleNegotiationResult);
                }
            }

            ServerMessage::Error {
                kind,
                message,
                target,
            } => {
                warn!("Server rejected a request: {}", message);
                self.emit(CallEvent::RelayError {
                    kind,
                    message,
                    target,
                });

                let unreachable = target.filter(|t| {
                    kind == RelayErrorKind::UnknownRelayTarget && self.remote_peer() == Some(*t)
                });
                if let Some(remote) = unreachable {
                    self.emit(CallEvent::CallFailed {
                        remote: Some(remote),
                        error: CallError::UnknownRelayTarget(remote),
                    });
                    self.end_call(HangupReason::Unreachable).await;
                }
            }
        }

        Ok(())
    }

    pub async fn handle_engine_event(
        &mut self,
        generation: u64,
        event: EngineEvent<RemoteTrackOf<F>>,
    ) -> Result<(), CallError> {
        if generation != self.generation {
            debug!("Dropping {:?} from an earlier session", event);
            if let EngineEvent::RemoteTrack(stream) = event {
                stream.stop();
            }
            return Err(CallError::StaleNegotiationResult);
        }

        match event {
            EngineEvent::NegotiationNeeded => {
                self.coalesce_negotiation_needed(generation);
                self.on_negotiation_needed().await
            }
            EngineEvent::RemoteTrack(stream) => self.on_remote_track(stream),
            EngineEvent::ConnectionFailed => {
                warn!("Peer connection failed");
                self.emit(CallEvent::CallFailed {
                    remote: self.remote_peer(),
                    error: CallError::Engine("peer connection failed".into()),
                });
                self.end_call(HangupReason::ConnectionLost).await;
                Ok(())
            }
        }
    }

    /// Folds negotiation-needed events already queued for this session into
    /// the one being handled. Other events keep their order.
    fn coalesce_negotiation_needed(&mut self, generation: u64) {
        let mut folded = 0;
        while let Ok((queued_generation, event)) = self.engine_rx.try_recv() {
            match event {
                EngineEvent::NegotiationNeeded if queued_generation == generation => folded += 1,
                other => self.backlog.push_back((queued_generation, other)),
            }
        }
        if folded > 0 {
            debug!("Coalesced {} negotiation-needed event(s)", folded);
        }
    }

    /// Everything except [`CallCommand::Shutdown`], which only the run loop
    /// understands.
    pub async fn handle_command(&mut self, cmd: CallCommand) -> Result<(), CallError> {
        match cmd {
            CallCommand::Join(room) => self.join_room(room),
            CallCommand::Call(remote) => self.initiate_call(remote).await,
            CallCommand::CallRoomPeer => {
                let Some(remote) = self.peers.first().map(|p| p.id) else {
                    return Err(CallError::invalid_state(
                        "call",
                        "nobody else is in the room",
                    ));
                };
                self.initiate_call(remote).await
            }
            CallCommand::Accept => self.accept_pending_call().await,
            CallCommand::SendStreams => self.publish_local_tracks().await,
            CallCommand::HangUp => {
                self.end_call(HangupReason::Local).await;
                Ok(())
            }
            CallCommand::Leave => {
                self.end_call(HangupReason::Local).await;
                self.room = None;
                self.peers.clear();
                self.signaling.leave_room()
            }
            CallCommand::Shutdown => Ok(()),
        }
    }
}
