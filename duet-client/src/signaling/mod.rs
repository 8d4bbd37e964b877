mod signaling_client;
mod ws_setup;

pub use signaling_client::*;
pub use ws_setup::*;
