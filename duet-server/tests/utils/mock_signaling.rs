use async_trait::async_trait;
use duet_core::{ConnectionId, ServerMessage};
use duet_server::{SignalingError, SignalingOutput};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: ConnectionId,
    pub msg: ServerMessage,
}

/// Mock SignalingOutput that captures all outgoing signals.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to send captured signals.
    tx: mpsc::UnboundedSender<Delivery>,
    /// All captured signals (for verification).
    signals: Arc<Mutex<Vec<Delivery>>>,
    /// Connections that behave as if their socket closed.
    offline: Arc<Mutex<HashSet<ConnectionId>>>,
}

impl MockSignalingOutput {
    /// Create a new MockSignalingOutput and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            signals: Arc::new(Mutex::new(Vec::new())),
            offline: Arc::new(Mutex::new(HashSet::new())),
        };
        (signaling, rx)
    }

    /// Create a MockSignalingOutput without a receiver (signals are only stored).
    pub fn new_stored_only() -> Self {
        let (signaling, _rx) = Self::new();
        signaling
    }

    pub async fn set_offline(&self, peer_id: ConnectionId) {
        self.offline.lock().await.insert(peer_id);
    }

    /// Every message delivered to `peer_id`, in order.
    pub async fn messages_for(&self, peer_id: &ConnectionId) -> Vec<ServerMessage> {
        self.signals
            .lock()
            .await
            .iter()
            .filter(|d| &d.to == peer_id)
            .map(|d| d.msg.clone())
            .collect()
    }

    /// `user:joined` announcements delivered to `peer_id`.
    pub async fn joined_announcements_for(&self, peer_id: &ConnectionId) -> Vec<ConnectionId> {
        self.messages_for(peer_id)
            .await
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::UserJoined { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub async fn total(&self) -> usize {
        self.signals.lock().await.len()
    }
}

impl Default for MockSignalingOutput {
    fn default() -> Self {
        Self::new_stored_only()
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn deliver(&self, to: ConnectionId, msg: ServerMessage) -> Result<(), SignalingError> {
        tracing::debug!("[MockSignaling] {} to {:?}", msg.type_tag(), to);

        if self.offline.lock().await.contains(&to) {
            return Err(SignalingError::UnknownRelayTarget(to));
        }

        let delivery = Delivery { to, msg };
        self.signals.lock().await.push(delivery.clone());
        let _ = self.tx.send(delivery);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signaling_captures_delivery() {
        let (signaling, mut rx) = MockSignalingOutput::new();
        let peer_id = ConnectionId::new();

        signaling
            .deliver(peer_id, ServerMessage::UserLeft { id: peer_id })
            .await
            .unwrap();

        let delivery = rx.recv().await.unwrap();
        assert_eq!(delivery.to, peer_id);
        assert_eq!(signaling.messages_for(&peer_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_signaling_offline_peer_fails() {
        let signaling = MockSignalingOutput::new_stored_only();
        let peer_id = ConnectionId::new();
        signaling.set_offline(peer_id).await;

        let result = signaling
            .deliver(peer_id, ServerMessage::UserLeft { id: peer_id })
            .await;

        assert_eq!(result, Err(SignalingError::UnknownRelayTarget(peer_id)));
        assert_eq!(signaling.total().await, 0);
    }
}
