use duet_core::utils::DEFAULT_ROOM_CAPACITY;
use std::net::SocketAddr;

/// Signaling server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Members a room accepts before rejecting joins with `room_full`.
    pub room_capacity: usize,
    /// Bound of each room's command queue.
    pub room_command_buffer: usize,
}

impl ServerConfig {
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_room_capacity(mut self, room_capacity: usize) -> Self {
        self.room_capacity = room_capacity.max(1);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            room_capacity: DEFAULT_ROOM_CAPACITY,
            room_command_buffer: 100,
        }
    }
}
