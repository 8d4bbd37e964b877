use crate::engine::PeerEngine;
use crate::error::CallError;
use crate::media::MediaStream;
use crate::negotiation::{NegotiationState, OfferKind, OfferOutcome, Role};
use crate::signaling::SignalingClient;
use duet_core::{ClientMessage, ConnectionId, SessionDescription};
use tracing::{debug, info, warn};

/// What [`NegotiationSession::set_remote_stream`] did with a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStreamUpdate {
    New,
    Extended,
    Ignored,
}

/// Offer/answer bookkeeping for one call with one remote peer.
///
/// Holds the peer connection and both media streams. Once closed, every
/// operation fails with [`CallError::StaleNegotiationResult`].
pub struct NegotiationSession<E: PeerEngine> {
    remote: ConnectionId,
    local_name: String,
    role: Role,
    state: NegotiationState,
    engine: E,
    signaling: SignalingClient,
    local_stream: Option<MediaStream<E::LocalTrack>>,
    remote_stream: Option<MediaStream<E::RemoteTrack>>,
    published: bool,
    renegotiation_pending: bool,
}

impl<E: PeerEngine> NegotiationSession<E> {
    pub fn new(
        remote: ConnectionId,
        local_name: impl Into<String>,
        role: Role,
        engine: E,
        signaling: SignalingClient,
    ) -> Self {
        Self {
            remote,
            local_name: local_name.into(),
            role,
            state: NegotiationState::Stable,
            engine,
            signaling,
            local_stream: None,
            remote_stream: None,
            published: false,
            renegotiation_pending: false,
        }
    }

    pub fn remote(&self) -> ConnectionId {
        self.remote
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == NegotiationState::Closed
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn local_stream(&self) -> Option<&MediaStream<E::LocalTrack>> {
        self.local_stream.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&MediaStream<E::RemoteTrack>> {
        self.remote_stream.as_ref()
    }

    pub fn renegotiation_pending(&self) -> bool {
        self.renegotiation_pending
    }

    pub fn set_local_stream(&mut self, stream: MediaStream<E::LocalTrack>) {
        self.local_stream = Some(stream);
    }

    /// Holds the first remote stream. Tracks arriving later under the same
    /// stream id join it; tracks of any other stream are stopped right away.
    pub fn set_remote_stream(&mut self, stream: MediaStream<E::RemoteTrack>) -> RemoteStreamUpdate {
        if self.is_closed() {
            stream.stop();
            return RemoteStreamUpdate::Ignored;
        }

        let Some(held) = self.remote_stream.as_mut() else {
            self.remote_stream = Some(stream);
            return RemoteStreamUpdate::New;
        };

        if held.id() != stream.id() {
            debug!("Dropping additional remote stream {}", stream.id());
            stream.stop();
            return RemoteStreamUpdate::Ignored;
        }

        match held.merge(stream) {
            0 => RemoteStreamUpdate::Ignored,
            added => {
                debug!("Remote stream {} gained {} track(s)", held.id(), added);
                RemoteStreamUpdate::Extended
            }
        }
    }

    pub async fn create_offer(&mut self, kind: OfferKind) -> Result<(), CallError> {
        match self.state {
            NegotiationState::Stable => {}
            NegotiationState::Closed => return Err(CallError::StaleNegotiationResult),
            other => return Err(CallError::invalid_state("create_offer", other)),
        }

        let offer = self.engine.create_offer().await?;
        self.engine.set_local_description(offer.clone()).await?;

        let msg = match kind {
            OfferKind::Invite => ClientMessage::UserCall {
                to: self.remote,
                offer,
                name: self.local_name.clone(),
            },
            OfferKind::Renegotiation => ClientMessage::NegoNeeded {
                offer,
                to: self.remote,
            },
        };
        self.signaling.send(msg)?;

        if kind == OfferKind::Renegotiation {
            self.renegotiation_pending = false;
        }
        self.state = NegotiationState::HaveLocalOffer(kind);
        info!("Sent {:?} offer to {:?}", kind, self.remote);
        Ok(())
    }

    /// Starts a renegotiation now, or marks one pending while another
    /// exchange is outstanding. Returns whether an offer went out.
    pub async fn request_renegotiation(&mut self) -> Result<bool, CallError> {
        match self.state {
            NegotiationState::Closed => Err(CallError::StaleNegotiationResult),
            NegotiationState::HaveLocalOffer(_) => {
                debug!("Renegotiation deferred until the current exchange completes");
                self.renegotiation_pending = true;
                Ok(false)
            }
            NegotiationState::Stable => {
                self.create_offer(OfferKind::Renegotiation).await?;
                Ok(true)
            }
        }
    }

    /// Clears and returns the pending renegotiation flag, but only once the
    /// session is stable again.
    pub fn take_pending_renegotiation(&mut self) -> bool {
        if self.state != NegotiationState::Stable {
            return false;
        }
        std::mem::take(&mut self.renegotiation_pending)
    }

    pub async fn receive_offer(
        &mut self,
        offer: SessionDescription,
        kind: OfferKind,
    ) -> Result<OfferOutcome, CallError> {
        if self.is_closed() {
            return Err(CallError::StaleNegotiationResult);
        }
        if !offer.is_offer() {
            return Err(CallError::MalformedDescription(format!(
                "expected an offer, got an {}",
                offer.kind
            )));
        }

        if let NegotiationState::HaveLocalOffer(own) = self.state {
            match self.role {
                Role::Impolite => {
                    info!("Ignoring offer from {:?} that collides with ours", self.remote);
                    return Ok(OfferOutcome::Ignored);
                }
                Role::Polite => {
                    warn!("Offer collision with {:?}, rolling back ours", self.remote);
                    self.engine.rollback().await?;
                    if own == OfferKind::Renegotiation {
                        self.renegotiation_pending = true;
                    }
                    self.state = NegotiationState::Stable;
                }
            }
        }

        self.engine.set_remote_description(offer).await?;
        let answer = self.engine.create_answer().await?;
        self.engine.set_local_description(answer.clone()).await?;

        let msg = match kind {
            OfferKind::Invite => ClientMessage::CallAccepted {
                to: self.remote,
                ans: answer,
            },
            OfferKind::Renegotiation => ClientMessage::NegoDone {
                to: self.remote,
                ans: answer,
            },
        };
        self.signaling.send(msg)?;

        info!("Answered {:?} offer from {:?}", kind, self.remote);
        Ok(OfferOutcome::Answered)
    }

    pub async fn receive_answer(
        &mut self,
        answer: SessionDescription,
        kind: OfferKind,
    ) -> Result<(), CallError> {
        match self.state {
            NegotiationState::HaveLocalOffer(own) if own == kind => {}
            NegotiationState::Closed => return Err(CallError::StaleNegotiationResult),
            other => {
                warn!("Rejecting {:?} answer from {:?} while {}", kind, self.remote, other);
                return Err(CallError::invalid_state("receive_answer", other));
            }
        }
        if !answer.is_answer() {
            return Err(CallError::MalformedDescription(format!(
                "expected an answer, got an {}",
                answer.kind
            )));
        }

        self.engine.set_remote_description(answer).await?;
        self.state = NegotiationState::Stable;
        info!("Applied {:?} answer from {:?}", kind, self.remote);
        Ok(())
    }

    /// Adds the local tracks to the connection once. Returns whether anything
    /// was published.
    pub async fn publish_local_tracks(&mut self) -> Result<bool, CallError> {
        if self.is_closed() {
            return Err(CallError::StaleNegotiationResult);
        }
        if self.published {
            return Ok(false);
        }
        let Some(stream) = &self.local_stream else {
            return Ok(false);
        };

        self.engine.publish(stream).await?;
        self.published = true;
        Ok(true)
    }

    /// Stops every track and closes the connection. Returns false if the
    /// session was already closed.
    pub async fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.state = NegotiationState::Closed;
        self.renegotiation_pending = false;

        let mut stopped = 0;
        if let Some(stream) = self.local_stream.take() {
            stopped += stream.stop();
        }
        if let Some(stream) = self.remote_stream.take() {
            stopped += stream.stop();
        }

        if let Err(e) = self.engine.close().await {
            warn!("Engine for {:?} did not close cleanly: {}", self.remote, e);
        }

        info!("Session with {:?} closed, {} track(s) stopped", self.remote, stopped);
        true
    }
}
