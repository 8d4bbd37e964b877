use crate::call::{CallCommand, CallController, CallEvent, HangupReason};
use crate::engine::{EngineFactory, LocalTrackOf};
use crate::error::CallError;
use crate::media::MediaDevices;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl<F, D> CallController<F, D>
where
    F: EngineFactory,
    D: MediaDevices<Track = LocalTrackOf<F>>,
{
    /// Runs until [`CallCommand::Shutdown`], until `commands` closes, or
    /// until the signaling connection goes away. A running call is ended
    /// first.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<CallCommand>,
    ) -> Result<(), CallError> {
        let mut subscription = self.signaling.subscribe()?;
        info!("Call controller for {} started", self.profile.name);

        loop {
            if let Some((generation, event)) = self.backlog.pop_front() {
                let result = self.handle_engine_event(generation, event).await;
                self.settle(result).await;
                continue;
            }

            let deadline = self.deadline.map(|d| d.at);

            tokio::select! {
                msg = subscription.recv() => {
                    let Some(msg) = msg else {
                        warn!("Signaling connection lost");
                        self.end_call(HangupReason::SignalingLost).await;
                        break;
                    };
                    let result = self.handle_server_message(msg).await;
                    self.settle(result).await;
                }

                Some((generation, event)) = self.engine_rx.recv() => {
                    let result = self.handle_engine_event(generation, event).await;
                    self.settle(result).await;
                }

                cmd = commands.recv() => match cmd {
                    None | Some(CallCommand::Shutdown) => {
                        self.end_call(HangupReason::Local).await;
                        break;
                    }
                    Some(cmd) => {
                        let result = self.handle_command(cmd).await;
                        self.settle(result).await;
                    }
                },

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_timeout().await;
                }
            }
        }

        info!("Call controller for {} stopped", self.profile.name);
        Ok(())
    }

    /// Reports a failed step. Stale results are dropped quietly; broken
    /// descriptions end the call.
    pub(super) async fn settle(&mut self, result: Result<(), CallError>) {
        let Err(error) = result else {
            return;
        };

        match error {
            CallError::StaleNegotiationResult => {
                debug!("Discarding stale negotiation result");
            }
            CallError::MalformedDescription(_) | CallError::Engine(_) => {
                warn!("Negotiation failed: {}", error);
                self.emit(CallEvent::CallFailed {
                    remote: self.remote_peer(),
                    error,
                });
                self.end_call(HangupReason::Failed).await;
            }
            other => {
                warn!("{}", other);
                self.emit(CallEvent::CallFailed {
                    remote: self.remote_peer(),
                    error: other,
                });
            }
        }
    }
}
