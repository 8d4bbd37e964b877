use crate::call::call_controller::PendingInvite;
use crate::call::{CallController, CallEvent, CallPhase};
use crate::engine::{EngineFactory, LocalTrackOf};
use crate::error::CallError;
use crate::media::MediaDevices;
use crate::negotiation::{OfferKind, OfferOutcome};
use duet_core::{ConnectionId, SessionDescription};
use tracing::{info, warn};

impl<F, D> CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    /// Reacts to `incomming:call`: answers it, holds it for the user, or
    /// refuses it when busy with someone else.
    pub async fn on_incoming_call(
        &mut self,
        from: ConnectionId,
        offer: SessionDescription,
        name: String,
    ) -> Result<(), CallError> {
        let busy_with_other = match &self.session {
            Some(session) => session.remote() != from,
            None => self
                .pending_invite
                .as_ref()
                .is_some_and(|invite| invite.from != from),
        };
        if busy_with_other {
            info!("Refusing call from {:?} ({}): busy", from, name);
            return self.signaling.end_call(from);
        }

        // Our own invitation to `from` is in flight. The session role decides
        // which offer survives.
        if self.session.is_some() {
            return self.accept_incoming_call(from, offer, name).await;
        }

        self.emit(CallEvent::IncomingCall {
            from,
            name: name.clone(),
        });

        if self.config.auto_accept {
            return self.accept_incoming_call(from, offer, name).await;
        }

        info!("Holding call from {:?} ({}) until accepted", from, name);
        self.pending_invite = Some(PendingInvite { from, offer, name });
        self.arm_deadline(self.config.call_timeout, "incoming call");
        Ok(())
    }

    /// Answers the invitation held by [`Self::on_incoming_call`].
    pub async fn accept_pending_call(&mut self) -> Result<(), CallError> {
        let Some(invite) = self.pending_invite.take() else {
            return Err(CallError::invalid_state(
                "accept",
                "no incoming call is waiting",
            ));
        };
        self.deadline = None;

        if self.session.as_ref().is_some_and(|s| s.remote() != invite.from) {
            warn!("Declining held call from {:?}: another call is running", invite.from);
            let _ = self.signaling.end_call(invite.from);
            return Err(CallError::invalid_state(
                "accept",
                "a call is already running",
            ));
        }

        self.accept_incoming_call(invite.from, invite.offer, invite.name)
            .await
    }

    /// Refuses the held invitation, if any, with `call:end`. Returns the
    /// caller that was turned down.
    pub(super) fn decline_pending_invite(&mut self) -> Option<ConnectionId> {
        let invite = self.pending_invite.take()?;
        self.deadline = None;

        info!("Declining held call from {:?} ({})", invite.from, invite.name);
        if let Err(e) = self.signaling.end_call(invite.from) {
            warn!("Could not decline call from {:?}: {}", invite.from, e);
        }
        Some(invite.from)
    }

    /// Captures local media and answers `offer` with `call:accepted`.
    ///
    /// If we invited `from` ourselves at the same time, the collision is
    /// resolved by the session's role.
    pub async fn accept_incoming_call(
        &mut self,
        from: ConnectionId,
        offer: SessionDescription,
        caller_name: String,
    ) -> Result<(), CallError> {
        if let Some(session) = self.session.as_mut() {
            if session.remote() != from {
                return Err(CallError::invalid_state(
                    "accept_incoming_call",
                    "a call is already running",
                ));
            }

            let outcome = session.receive_offer(offer, OfferKind::Invite).await?;
            if outcome == OfferOutcome::Answered {
                self.deadline = None;
                self.emit(CallEvent::IncomingCall {
                    from,
                    name: caller_name.clone(),
                });
                self.remote_name = Some(caller_name);
                self.emit(CallEvent::CallEstablished { remote: from });
            }
            return Ok(());
        }

        self.phase = CallPhase::Capturing;

        let stream = match self.devices.get_user_media(self.config.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Media capture failed, refusing call from {:?}: {}", from, e);
                self.phase = CallPhase::Idle;
                let _ = self.signaling.end_call(from);
                return Err(e);
            }
        };

        let mut session = match self.open_session(from).await {
            Ok(session) => session,
            Err(e) => {
                stream.stop();
                self.phase = CallPhase::Idle;
                let _ = self.signaling.end_call(from);
                return Err(e);
            }
        };
        session.set_local_stream(stream);

        if let Err(e) = session.receive_offer(offer, OfferKind::Invite).await {
            session.close().await;
            self.generation += 1;
            self.phase = CallPhase::Idle;
            let _ = self.signaling.end_call(from);
            return Err(e);
        }

        info!("Accepted call from {:?} ({})", from, caller_name);
        self.session = Some(session);
        self.remote_name = Some(caller_name);
        self.phase = CallPhase::InCall;
        self.emit(CallEvent::CallEstablished { remote: from });

        if self.config.publish_on_accept {
            self.publish_local_tracks().await?;
        }
        Ok(())
    }

    /// Applies the callee's `call:accepted` and publishes our tracks, which
    /// starts the first renegotiation.
    pub async fn on_answer_received(
        &mut self,
        from: ConnectionId,
        answer: SessionDescription,
    ) -> Result<(), CallError> {
        let session = self.session_with(from)?;
        session.receive_answer(answer, OfferKind::Invite).await?;

        self.deadline = None;
        info!("Call with {:?} established", from);
        self.emit(CallEvent::CallEstablished { remote: from });

        self.publish_local_tracks().await
    }
}
