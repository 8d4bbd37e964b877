pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Default room capacity: the protocol pairs exactly two callers.
pub const DEFAULT_ROOM_CAPACITY: usize = 2;
