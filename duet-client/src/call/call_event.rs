use crate::error::CallError;
use duet_core::{ConnectionId, PeerInfo, RelayErrorKind, RoomId};

/// Where the controller is in a call. `Ended` only lasts while a call is
/// being torn down; afterwards the controller is `Idle` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    Capturing,
    InCall,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangupReason {
    /// The local user hung up.
    Local,
    /// The remote peer sent `call:end`.
    Remote,
    PeerLeft,
    Timeout,
    /// The server could not reach the remote peer.
    Unreachable,
    ConnectionLost,
    SignalingLost,
    /// Negotiation failed beyond repair.
    Failed,
}

impl HangupReason {
    /// Whether the remote peer still needs to be told with `call:end`.
    pub fn notifies_remote(&self) -> bool {
        matches!(
            self,
            HangupReason::Local
                | HangupReason::Timeout
                | HangupReason::ConnectionLost
                | HangupReason::Failed
        )
    }
}

/// Progress reports from a [`crate::CallController`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    Connected {
        id: ConnectionId,
    },
    Joined {
        room: RoomId,
        peers: Vec<PeerInfo>,
    },
    PeerJoined(PeerInfo),
    PeerLeft(ConnectionId),
    Calling {
        to: ConnectionId,
    },
    IncomingCall {
        from: ConnectionId,
        name: String,
    },
    CallEstablished {
        remote: ConnectionId,
    },
    RemoteStream {
        remote: ConnectionId,
        stream_id: String,
    },
    Renegotiated {
        remote: ConnectionId,
    },
    CallFailed {
        remote: Option<ConnectionId>,
        error: CallError,
    },
    HungUp {
        remote: ConnectionId,
        reason: HangupReason,
    },
    RelayError {
        kind: RelayErrorKind,
        message: String,
        target: Option<ConnectionId>,
    },
}
