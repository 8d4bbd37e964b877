use crate::model::connection::ConnectionId;
use crate::model::profile::PeerInfo;
use crate::model::room::RoomId;
use crate::model::session_description::SessionDescription;
use serde::{Deserialize, Serialize};

/// Messages a client sends to the signaling server.
///
/// Every frame is `{"type": <tag>, "payload": {...}}`. Tags keep the names the
/// browser client already speaks, including the `incomming:call` spelling on
/// the server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "room:join")]
    RoomJoin {
        email: String,
        room: RoomId,
        name: String,
    },

    #[serde(rename = "room:leave")]
    RoomLeave {},

    #[serde(rename = "user:call")]
    UserCall {
        to: ConnectionId,
        offer: SessionDescription,
        name: String,
    },

    #[serde(rename = "call:accepted")]
    CallAccepted {
        to: ConnectionId,
        ans: SessionDescription,
    },

    #[serde(rename = "peer:nego:needed")]
    NegoNeeded {
        offer: SessionDescription,
        to: ConnectionId,
    },

    #[serde(rename = "peer:nego:done")]
    NegoDone {
        to: ConnectionId,
        ans: SessionDescription,
    },

    #[serde(rename = "call:end")]
    CallEnd { to: ConnectionId },
}

impl ClientMessage {
    /// Connection a relayed message is addressed to, `None` for messages the
    /// server handles itself.
    pub fn target(&self) -> Option<ConnectionId> {
        match self {
            ClientMessage::RoomJoin { .. } | ClientMessage::RoomLeave {} => None,
            ClientMessage::UserCall { to, .. }
            | ClientMessage::CallAccepted { to, .. }
            | ClientMessage::NegoNeeded { to, .. }
            | ClientMessage::NegoDone { to, .. }
            | ClientMessage::CallEnd { to } => Some(*to),
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            ClientMessage::RoomJoin { .. } => "room:join",
            ClientMessage::RoomLeave {} => "room:leave",
            ClientMessage::UserCall { .. } => "user:call",
            ClientMessage::CallAccepted { .. } => "call:accepted",
            ClientMessage::NegoNeeded { .. } => "peer:nego:needed",
            ClientMessage::NegoDone { .. } => "peer:nego:done",
            ClientMessage::CallEnd { .. } => "call:end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayErrorKind {
    UnknownRelayTarget,
    AlreadyJoined,
    NotJoined,
    RoomFull,
    RoomUnavailable,
}

/// Messages the signaling server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "session:welcome")]
    Welcome { id: ConnectionId },

    /// Acknowledges a join to the joiner. `peers` lists the members that were
    /// already in the room.
    #[serde(rename = "room:join")]
    RoomJoin {
        email: String,
        room: RoomId,
        name: String,
        #[serde(default)]
        peers: Vec<PeerInfo>,
    },

    #[serde(rename = "user:joined")]
    UserJoined {
        email: String,
        id: ConnectionId,
        name: String,
    },

    #[serde(rename = "user:left")]
    UserLeft { id: ConnectionId },

    #[serde(rename = "incomming:call")]
    IncomingCall {
        from: ConnectionId,
        offer: SessionDescription,
        name: String,
    },

    #[serde(rename = "call:accepted")]
    CallAccepted {
        from: ConnectionId,
        ans: SessionDescription,
    },

    #[serde(rename = "peer:nego:needed")]
    NegoNeeded {
        from: ConnectionId,
        offer: SessionDescription,
    },

    #[serde(rename = "peer:nego:final")]
    NegoFinal {
        ans: SessionDescription,
        from: ConnectionId,
    },

    #[serde(rename = "call:ended")]
    CallEnded { from: ConnectionId },

    #[serde(rename = "relay:error")]
    Error {
        kind: RelayErrorKind,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ConnectionId>,
    },
}

impl ServerMessage {
    pub fn type_tag(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "session:welcome",
            ServerMessage::RoomJoin { .. } => "room:join",
            ServerMessage::UserJoined { .. } => "user:joined",
            ServerMessage::UserLeft { .. } => "user:left",
            ServerMessage::IncomingCall { .. } => "incomming:call",
            ServerMessage::CallAccepted { .. } => "call:accepted",
            ServerMessage::NegoNeeded { .. } => "peer:nego:needed",
            ServerMessage::NegoFinal { .. } => "peer:nego:final",
            ServerMessage::CallEnded { .. } => "call:ended",
            ServerMessage::Error { .. } => "relay:error",
        }
    }

    /// Rewrites a relayed client message into what the target receives:
    /// `to` becomes `from`, payloads pass through untouched.
    pub fn relayed(from: ConnectionId, msg: ClientMessage) -> Option<Self> {
        let relayed = match msg {
            ClientMessage::UserCall { offer, name, .. } => {
                ServerMessage::IncomingCall { from, offer, name }
            }
            ClientMessage::CallAccepted { ans, .. } => ServerMessage::CallAccepted { from, ans },
            ClientMessage::NegoNeeded { offer, .. } => ServerMessage::NegoNeeded { from, offer },
            ClientMessage::NegoDone { ans, .. } => ServerMessage::NegoFinal { ans, from },
            ClientMessage::CallEnd { .. } => ServerMessage::CallEnded { from },
            ClientMessage::RoomJoin { .. } | ClientMessage::RoomLeave {} => return None,
        };
        Some(relayed)
    }
}
