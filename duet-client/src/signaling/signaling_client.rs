use crate::error::CallError;
use duet_core::{ClientMessage, ConnectionId, Profile, RoomId, ServerMessage};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

type InboundSlot = Arc<Mutex<Option<mpsc::UnboundedReceiver<ServerMessage>>>>;

/// Handle to the signaling connection.
///
/// Outbound messages can be sent from any clone. Inbound messages go to the
/// single active [`Subscription`].
#[derive(Clone)]
pub struct SignalingClient {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    inbound: InboundSlot,
}

impl SignalingClient {
    /// Wraps an already established transport. `outbound` carries what this
    /// client sends, `inbound` what the server pushes to it.
    pub fn from_channels(
        outbound: mpsc::UnboundedSender<ClientMessage>,
        inbound: mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Self {
        Self {
            outbound,
            inbound: Arc::new(Mutex::new(Some(inbound))),
        }
    }

    pub fn send(&self, msg: ClientMessage) -> Result<(), CallError> {
        debug!("Signaling out: {}", msg.type_tag());
        self.outbound
            .send(msg)
            .map_err(|_| CallError::SignalingClosed)
    }

    pub fn join_room(&self, profile: &Profile, room: RoomId) -> Result<(), CallError> {
        self.send(ClientMessage::RoomJoin {
            email: profile.email.clone(),
            room,
            name: profile.name.clone(),
        })
    }

    pub fn leave_room(&self) -> Result<(), CallError> {
        self.send(ClientMessage::RoomLeave {})
    }

    pub fn end_call(&self, to: ConnectionId) -> Result<(), CallError> {
        self.send(ClientMessage::CallEnd { to })
    }

    /// Takes the inbound stream. Only one subscription can be active; the
    /// stream is handed back when it is dropped.
    pub fn subscribe(&self) -> Result<Subscription, CallError> {
        let rx = lock(&self.inbound)
            .take()
            .ok_or(CallError::AlreadySubscribed)?;

        Ok(Subscription {
            rx: Some(rx),
            slot: self.inbound.clone(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

fn lock(slot: &InboundSlot) -> MutexGuard<'_, Option<mpsc::UnboundedReceiver<ServerMessage>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scoped access to the inbound message stream.
pub struct Subscription {
    rx: Option<mpsc::UnboundedReceiver<ServerMessage>>,
    slot: InboundSlot,
}

impl Subscription {
    /// `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    pub fn try_recv(&mut self) -> Option<ServerMessage> {
        self.rx.as_mut().and_then(|rx| rx.try_recv().ok())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(rx) = self.rx.take() {
            *lock(&self.slot) = Some(rx);
        }
    }
}
