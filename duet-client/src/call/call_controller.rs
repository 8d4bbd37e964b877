use crate::call::{CallEvent, CallPhase};
use crate::config::ClientConfig;
use crate::engine::{
    EngineEvent, EngineEventRx, EngineEventSender, EngineFactory, LocalTrackOf, RemoteTrackOf,
};
use crate::error::CallError;
use crate::media::MediaDevices;
use crate::negotiation::{NegotiationSession, NegotiationState, Role};
use crate::signaling::SignalingClient;
use duet_core::{ConnectionId, PeerInfo, Profile, RoomId, SessionDescription};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

pub(super) struct PendingInvite {
    pub from: ConnectionId,
    pub offer: SessionDescription,
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Deadline {
    pub at: Instant,
    pub what: &'static str,
}

/// Drives one user's side of a call.
///
/// Owns at most one [`NegotiationSession`]. Server messages, engine events
/// and user commands are all handled on the task that calls
/// [`CallController::run`], so no call state is shared.
pub struct CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    pub(super) profile: Profile,
    pub(super) config: ClientConfig,
    pub(super) signaling: SignalingClient,
    pub(super) factory: F,
    pub(super) devices: D,
    pub(super) local_id: Option<ConnectionId>,
    pub(super) room: Option<RoomId>,
    pub(super) peers: Vec<PeerInfo>,
    pub(super) phase: CallPhase,
    pub(super) session: Option<NegotiationSession<F::Engine>>,
    pub(super) remote_name: Option<String>,
    pub(super) pending_invite: Option<PendingInvite>,
    /// Bumped whenever a session starts or ends. Engine events carry the
    /// generation they were created under.
    pub(super) generation: u64,
    pub(super) engine_tx: mpsc::UnboundedSender<(u64, EngineEvent<RemoteTrackOf<F>>)>,
    pub(super) engine_rx: EngineEventRx<RemoteTrackOf<F>>,
    pub(super) backlog: VecDeque<(u64, EngineEvent<RemoteTrackOf<F>>)>,
    pub(super) deadline: Option<Deadline>,
    pub(super) events: mpsc::UnboundedSender<CallEvent>,
}

impl<F, D> CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    pub fn new(
        profile: Profile,
        config: ClientConfig,
        signaling: SignalingClient,
        factory: F,
        devices: D,
    ) -> (Self, mpsc::UnboundedReceiver<CallEvent>) {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let controller = Self {
            profile,
            config,
            signaling,
            factory,
            devices,
            local_id: None,
            room: None,
            peers: Vec::new(),
            phase: CallPhase::Idle,
            session: None,
            remote_name: None,
            pending_invite: None,
            generation: 0,
            engine_tx,
            engine_rx,
            backlog: VecDeque::new(),
            deadline: None,
            events,
        };

        (controller, events_rx)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Our connection id, known once the server has greeted us.
    pub fn local_id(&self) -> Option<ConnectionId> {
        self.local_id
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Other members of the joined room.
    pub fn peers(&self) -> &[PeerInfo] {
        &self.peers
    }

    pub fn remote_peer(&self) -> Option<ConnectionId> {
        self.session.as_ref().map(|s| s.remote())
    }

    pub fn remote_name(&self) -> Option<&str> {
        self.remote_name.as_deref()
    }

    pub fn session(&self) -> Option<&NegotiationSession<F::Engine>> {
        self.session.as_ref()
    }

    pub fn negotiation_state(&self) -> Option<NegotiationState> {
        self.session.as_ref().map(|s| s.state())
    }

    pub fn has_pending_invite(&self) -> bool {
        self.pending_invite.is_some()
    }

    pub fn join_room(&mut self, room: RoomId) -> Result<(), CallError> {
        self.signaling.join_room(&self.profile, room)
    }

    pub(super) fn emit(&self, event: CallEvent) {
        if self.events.send(event).is_err() {
            debug!("Nobody is listening for call events");
        }
    }

    pub(super) fn arm_deadline(&mut self, timeout: Duration, what: &'static str) {
        self.deadline = Some(Deadline {
            at: Instant::now() + timeout,
            what,
        });
    }

    /// The running session, if it belongs to `from`. Anything else refers
    /// to a call that is over.
    pub(super) fn session_with(
        &mut self,
        from: ConnectionId,
    ) -> Result<&mut NegotiationSession<F::Engine>, CallError> {
        match self.session.as_mut() {
            Some(session) if session.remote() == from => Ok(session),
            _ => Err(CallError::StaleNegotiationResult),
        }
    }

    /// Creates a fresh peer connection for a call with `remote`.
    pub(super) async fn open_session(
        &mut self,
        remote: ConnectionId,
    ) -> Result<NegotiationSession<F::Engine>, CallError> {
        self.generation += 1;
        let events = EngineEventSender::new(self.generation, self.engine_tx.clone());
        let engine = self.factory.create(events).await?;

        // Without a welcome there is nothing to compare; yielding is the
        // side that cannot deadlock.
        let role = match self.local_id {
            Some(local) => Role::for_pair(local, remote),
            None => Role::Polite,
        };

        Ok(NegotiationSession::new(
            remote,
            self.profile.name.clone(),
            role,
            engine,
            self.signaling.clone(),
        ))
    }
}
