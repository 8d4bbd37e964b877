use crate::model::connection::ConnectionId;
use serde::{Deserialize, Serialize};

/// What a user typed in the lobby form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub email: String,
    pub name: String,
}

impl Profile {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// A room member as seen by other members.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: ConnectionId,
    pub email: String,
    pub name: String,
}

impl PeerInfo {
    pub fn new(id: ConnectionId, profile: &Profile) -> Self {
        Self {
            id,
            email: profile.email.clone(),
            name: profile.name.clone(),
        }
    }

    pub fn profile(&self) -> Profile {
        Profile::new(self.email.clone(), self.name.clone())
    }
}
