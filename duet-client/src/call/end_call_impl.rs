use crate::call::{CallController, CallEvent, CallPhase, HangupReason};
use crate::engine::{EngineEvent, EngineFactory, LocalTrackOf};
use crate::error::CallError;
use crate::media::MediaDevices;
use tracing::{debug, info, warn};

impl<F, D> CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    /// Stops every track, closes the peer connection and resets the
    /// controller to [`CallPhase::Idle`], ready for the next call. Returns
    /// false if there was no call to end.
    pub async fn end_call(&mut self, reason: HangupReason) -> bool {
        self.deadline = None;

        if reason.notifies_remote() {
            self.decline_pending_invite();
        } else {
            self.pending_invite = None;
        }

        let Some(mut session) = self.session.take() else {
            return false;
        };

        // Anything the old engine still reports is now stale.
        self.generation += 1;
        for (_, event) in self.backlog.drain(..) {
            if let EngineEvent::RemoteTrack(stream) = event {
                stream.stop();
            }
        }

        let remote = session.remote();
        self.phase = CallPhase::Ended;
        session.close().await;

        if reason.notifies_remote() {
            if let Err(e) = self.signaling.end_call(remote) {
                debug!("Could not notify {:?} of hang up: {}", remote, e);
            }
        }

        self.phase = CallPhase::Idle;
        self.remote_name = None;
        info!("Call with {:?} ended ({:?})", remote, reason);
        self.emit(CallEvent::HungUp { remote, reason });
        true
    }

    /// Called when the armed deadline passes without an answer.
    pub async fn on_timeout(&mut self) {
        let Some(deadline) = self.deadline.take() else {
            return;
        };

        warn!("{} timed out", deadline.what);
        self.emit(CallEvent::CallFailed {
            remote: self.remote_peer(),
            error: CallError::Timeout(deadline.what),
        });
        self.end_call(HangupReason::Timeout).await;
    }
}
