use duet_core::ConnectionId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("media capture was denied: {0}")]
    MediaAcquisitionDenied(String),

    #[error("no capture device available for {0}")]
    NoDevice(String),

    #[error("peer {0} is not connected")]
    UnknownRelayTarget(ConnectionId),

    #[error("malformed session description: {0}")]
    MalformedDescription(String),

    #[error("negotiation result arrived for a session that is no longer active")]
    StaleNegotiationResult,

    #[error("{operation} is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("media engine error: {0}")]
    Engine(String),

    #[error("signaling transport error: {0}")]
    Transport(String),

    #[error("signaling connection closed")]
    SignalingClosed,

    #[error("signaling stream already has a subscriber")]
    AlreadySubscribed,
}

impl CallError {
    pub(crate) fn engine(err: impl std::fmt::Display) -> Self {
        CallError::Engine(err.to_string())
    }

    pub(crate) fn invalid_state(operation: &'static str, state: impl std::fmt::Display) -> Self {
        CallError::InvalidState {
            operation,
            state: state.to_string(),
        }
    }
}
