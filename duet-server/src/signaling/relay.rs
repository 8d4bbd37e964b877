use crate::error::SignalingError;
use crate::registry::Registry;
use crate::signaling::SignalingOutput;
use duet_core::{ConnectionId, ServerMessage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pass-through forwarding between two connections. Payloads, SDP included,
/// are never inspected.
#[derive(Clone)]
pub struct Relay {
    registry: Registry,
    signaling: Arc<dyn SignalingOutput>,
}

impl Relay {
    pub fn new(registry: Registry, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            registry,
            signaling,
        }
    }

    /// Delivers `msg` to `to` if it is a live connection in the sender's
    /// room. Otherwise the message is dropped and `from` gets a
    /// `relay:error`.
    pub async fn relay(
        &self,
        from: ConnectionId,
        to: ConnectionId,
        msg: ServerMessage,
    ) -> Result<(), SignalingError> {
        let tag = msg.type_tag();

        let delivered = match self.check_route(from, to) {
            Ok(()) => self.signaling.deliver(to, msg).await,
            Err(e) => Err(e),
        };

        match delivered {
            Ok(()) => {
                debug!("Relayed {} from {:?} to {:?}", tag, from, to);
                Ok(())
            }
            Err(e) => {
                warn!("Dropping {} from {:?}: {}", tag, from, e);
                self.report(from, &e).await;
                Err(e)
            }
        }
    }

    /// Only members of a room may relay, and only to a member of the same
    /// room. A target elsewhere is reported as unknown.
    fn check_route(&self, from: ConnectionId, to: ConnectionId) -> Result<(), SignalingError> {
        let sender = self
            .registry
            .lookup(&from)
            .ok_or(SignalingError::NotJoined(from))?;

        match self.registry.lookup(&to) {
            Some(target) if target.room == sender.room => Ok(()),
            _ => Err(SignalingError::UnknownRelayTarget(to)),
        }
    }

    /// Sends an error back to the connection that caused it.
    pub async fn report(&self, to: ConnectionId, err: &SignalingError) {
        if let Err(e) = self.signaling.deliver(to, err.to_message()).await {
            debug!("Could not report error to {:?}: {}", to, e);
        }
    }
}
