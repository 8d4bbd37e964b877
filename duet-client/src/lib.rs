mod call;
mod config;
mod engine;
mod error;
mod media;
mod negotiation;
mod signaling;

pub use call::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use negotiation::*;
pub use signaling::*;
