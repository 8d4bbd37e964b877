mod connection;
mod profile;
mod room;
mod session_description;
mod signaling;

pub use connection::ConnectionId;
pub use profile::{PeerInfo, Profile};
pub use room::RoomId;
pub use session_description::{SdpKind, SessionDescription};
pub use signaling::{ClientMessage, RelayErrorKind, ServerMessage};
