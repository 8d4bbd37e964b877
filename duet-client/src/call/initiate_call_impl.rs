use crate::call::{CallController, CallEvent, CallPhase};
use crate::engine::{EngineFactory, LocalTrackOf};
use crate::error::CallError;
use crate::media::MediaDevices;
use crate::negotiation::OfferKind;
use duet_core::ConnectionId;
use tracing::{info, warn};

impl<F, D> CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    /// Captures local media and invites `remote` with `user:call`.
    pub async fn initiate_call(&mut self, remote: ConnectionId) -> Result<(), CallError> {
        if self.session.is_some() {
            return Err(CallError::invalid_state(
                "initiate_call",
                "a call is already running",
            ));
        }
        if self.local_id == Some(remote) {
            return Err(CallError::invalid_state("initiate_call", "calling ourselves"));
        }

        match self.pending_invite.as_ref().map(|invite| invite.from) {
            Some(from) if from == remote => {
                info!("{:?} is already calling us, answering instead", remote);
                return self.accept_pending_call().await;
            }
            Some(_) => {
                self.decline_pending_invite();
            }
            None => {}
        }

        info!("Calling {:?}", remote);
        self.phase = CallPhase::Capturing;

        let stream = match self.devices.get_user_media(self.config.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Media capture failed: {}", e);
                self.phase = CallPhase::Idle;
                return Err(e);
            }
        };

        let mut session = match self.open_session(remote).await {
            Ok(session) => session,
            Err(e) => {
                stream.stop();
                self.phase = CallPhase::Idle;
                return Err(e);
            }
        };
        session.set_local_stream(stream);

        if let Err(e) = session.create_offer(OfferKind::Invite).await {
            session.close().await;
            self.generation += 1;
            self.phase = CallPhase::Idle;
            return Err(e);
        }

        self.session = Some(session);
        self.phase = CallPhase::InCall;
        self.arm_deadline(self.config.call_timeout, "call invitation");
        self.emit(CallEvent::Calling { to: remote });
        Ok(())
    }
}
