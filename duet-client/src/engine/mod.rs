use crate::error::CallError;
use crate::media::{MediaStream, MediaTrack};
use async_trait::async_trait;
use duet_core::SessionDescription;
use tokio::sync::mpsc;

mod rtc_engine;
mod synthetic_devices;

pub use rtc_engine::*;
pub use synthetic_devices::*;

/// Something the peer connection reports on its own.
pub enum EngineEvent<R> {
    /// Local tracks changed and a new offer is required.
    NegotiationNeeded,
    RemoteTrack(MediaStream<R>),
    ConnectionFailed,
}

impl<R> std::fmt::Debug for EngineEvent<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::NegotiationNeeded => f.write_str("NegotiationNeeded"),
            EngineEvent::RemoteTrack(stream) => write!(f, "RemoteTrack({})", stream.id()),
            EngineEvent::ConnectionFailed => f.write_str("ConnectionFailed"),
        }
    }
}

pub(crate) type EngineEventRx<R> = mpsc::UnboundedReceiver<(u64, EngineEvent<R>)>;

/// Handle an engine uses to report [`EngineEvent`]s. Every event is stamped
/// with the generation of the session the engine was created for, so events
/// from a torn down session can be told apart.
pub struct EngineEventSender<R> {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, EngineEvent<R>)>,
}

impl<R> Clone for EngineEventSender<R> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            tx: self.tx.clone(),
        }
    }
}

impl<R> EngineEventSender<R> {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, EngineEvent<R>)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the controller is gone.
    pub fn send(&self, event: EngineEvent<R>) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }
}

/// One peer connection.
#[async_trait]
pub trait PeerEngine: Send + Sync + 'static {
    type LocalTrack: MediaTrack;
    type RemoteTrack: MediaTrack;

    async fn create_offer(&self) -> Result<SessionDescription, CallError>;

    async fn create_answer(&self) -> Result<SessionDescription, CallError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), CallError>;

    /// Fails with [`CallError::MalformedDescription`] if the description
    /// cannot be applied.
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), CallError>;

    /// Discards a local offer that has not been answered yet.
    async fn rollback(&self) -> Result<(), CallError>;

    /// Adds every track of `stream` to the connection.
    async fn publish(&self, stream: &MediaStream<Self::LocalTrack>) -> Result<(), CallError>;

    async fn close(&self) -> Result<(), CallError>;
}

#[async_trait]
pub trait EngineFactory: Send + Sync {
    type Engine: PeerEngine;

    async fn create(
        &self,
        events: EngineEventSender<<Self::Engine as PeerEngine>::RemoteTrack>,
    ) -> Result<Self::Engine, CallError>;
}

pub type LocalTrackOf<F> = <<F as EngineFactory>::Engine as PeerEngine>::LocalTrack;
pub type RemoteTrackOf<F> = <<F as EngineFactory>::Engine as PeerEngine>::RemoteTrack;
