use duet_core::{ConnectionId, RoomId};

/// What the local user asks the controller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallCommand {
    Join(RoomId),
    Call(ConnectionId),
    /// Call the first other member of the joined room.
    CallRoomPeer,
    /// Answer the invitation being held when auto accept is off.
    Accept,
    /// Publish the local tracks onto the running call.
    SendStreams,
    HangUp,
    Leave,
    Shutdown,
}
