use duet_core::{ConnectionId, RelayErrorKind, RoomId, ServerMessage};
use thiserror::Error;

/// Failures scoped to a single connection. None of them stops the server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("connection {0} is already registered")]
    AlreadyJoined(ConnectionId),

    #[error("connection {0} has not joined a room")]
    NotJoined(ConnectionId),

    #[error("room {room} is full ({capacity} members)")]
    RoomFull { room: RoomId, capacity: usize },

    #[error("relay target {0} is not connected")]
    UnknownRelayTarget(ConnectionId),

    #[error("room {0} is unavailable")]
    RoomUnavailable(RoomId),
}

impl SignalingError {
    pub fn kind(&self) -> RelayErrorKind {
        match self {
            SignalingError::AlreadyJoined(_) => RelayErrorKind::AlreadyJoined,
            SignalingError::NotJoined(_) => RelayErrorKind::NotJoined,
            SignalingError::RoomFull { .. } => RelayErrorKind::RoomFull,
            SignalingError::UnknownRelayTarget(_) => RelayErrorKind::UnknownRelayTarget,
            SignalingError::RoomUnavailable(_) => RelayErrorKind::RoomUnavailable,
        }
    }

    /// The error as reported back to the offending connection.
    pub fn to_message(&self) -> ServerMessage {
        let target = match self {
            SignalingError::UnknownRelayTarget(id) => Some(*id),
            _ => None,
        };

        ServerMessage::Error {
            kind: self.kind(),
            message: self.to_string(),
            target,
        }
    }
}
