use crate::call::{CallController, CallEvent};
use crate::engine::{EngineFactory, LocalTrackOf, RemoteTrackOf};
use crate::error::CallError;
use crate::media::{MediaDevices, MediaStream};
use crate::negotiation::{OfferKind, OfferOutcome, RemoteStreamUpdate};
use duet_core::{ConnectionId, SessionDescription};
use tracing::{debug, info};

impl<F, D> CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    /// Adds the captured tracks to the running call. The engine answers with
    /// a negotiation-needed event.
    pub async fn publish_local_tracks(&mut self) -> Result<(), CallError> {
        let phase = self.phase;
        let Some(session) = self.session.as_mut() else {
            return Err(CallError::invalid_state("publish_local_tracks", format!("{:?}", phase)));
        };

        if session.publish_local_tracks().await? {
            info!("Published local tracks to {:?}", session.remote());
        }
        Ok(())
    }

    pub async fn on_negotiation_needed(&mut self) -> Result<(), CallError> {
        let Some(session) = self.session.as_mut() else {
            return Err(CallError::StaleNegotiationResult);
        };

        if session.request_renegotiation().await? {
            self.arm_deadline(self.config.renegotiation_timeout, "renegotiation");
        }
        Ok(())
    }

    /// Answers `peer:nego:needed` with `peer:nego:done`.
    pub async fn on_renegotiation_offer(
        &mut self,
        from: ConnectionId,
        offer: SessionDescription,
    ) -> Result<(), CallError> {
        let session = self.session_with(from)?;
        let outcome = session.receive_offer(offer, OfferKind::Renegotiation).await?;

        if outcome == OfferOutcome::Answered {
            self.emit(CallEvent::Renegotiated { remote: from });
        }
        self.replay_pending_renegotiation().await
    }

    /// Applies `peer:nego:final`.
    pub async fn on_renegotiation_answer(
        &mut self,
        from: ConnectionId,
        answer: SessionDescription,
    ) -> Result<(), CallError> {
        let session = self.session_with(from)?;
        session
            .receive_answer(answer, OfferKind::Renegotiation)
            .await?;

        self.deadline = None;
        self.emit(CallEvent::Renegotiated { remote: from });
        self.replay_pending_renegotiation().await
    }

    /// Collects the remote tracks of the call. The engine reports one track
    /// at a time; tracks sharing a stream id end up in one held stream.
    pub fn on_remote_track(&mut self, stream: MediaStream<RemoteTrackOf<F>>) -> Result<(), CallError> {
        let Some(session) = self.session.as_mut() else {
            stream.stop();
            return Err(CallError::StaleNegotiationResult);
        };

        let stream_id = stream.id().to_owned();
        let remote = session.remote();
        match session.set_remote_stream(stream) {
            RemoteStreamUpdate::New => {
                info!("Receiving stream {} from {:?}", stream_id, remote);
                self.emit(CallEvent::RemoteStream { remote, stream_id });
            }
            RemoteStreamUpdate::Extended => {
                debug!("Stream {} from {:?} gained a track", stream_id, remote);
            }
            RemoteStreamUpdate::Ignored => {}
        }
        Ok(())
    }

    /// Sends the renegotiation offer that was deferred while another
    /// exchange was outstanding.
    async fn replay_pending_renegotiation(&mut self) -> Result<(), CallError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if !session.take_pending_renegotiation() {
            return Ok(());
        }

        debug!("Replaying deferred renegotiation with {:?}", session.remote());
        session.create_offer(OfferKind::Renegotiation).await?;
        self.arm_deadline(self.config.renegotiation_timeout, "renegotiation");
        Ok(())
    }
}
