mod registry;
mod room;
mod room_command;

pub use registry::*;
pub use room::*;
pub use room_command::*;
