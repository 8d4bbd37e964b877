use duet_core::ConnectionId;
use std::fmt;

/// Which exchange an offer belongs to. The first offer of a call is an
/// invitation, every later one renegotiates the running call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferKind {
    Invite,
    Renegotiation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Stable,
    HaveLocalOffer(OfferKind),
    Closed,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationState::Stable => f.write_str("stable"),
            NegotiationState::HaveLocalOffer(OfferKind::Invite) => {
                f.write_str("waiting for the call to be accepted")
            }
            NegotiationState::HaveLocalOffer(OfferKind::Renegotiation) => {
                f.write_str("waiting for a renegotiation answer")
            }
            NegotiationState::Closed => f.write_str("closed"),
        }
    }
}

/// How a session reacts to an offer that collides with its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Rolls back its own offer and answers the remote one.
    Polite,
    /// Keeps its own offer and ignores the remote one.
    Impolite,
}

impl Role {
    /// The side with the greater connection id is polite, so the two ends of
    /// a call always disagree.
    pub fn for_pair(local: ConnectionId, remote: ConnectionId) -> Self {
        if local > remote {
            Role::Polite
        } else {
            Role::Impolite
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Answered,
    /// The offer collided with ours and we are the impolite side.
    Ignored,
}
