use crate::media::MediaConstraints;
use duet_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ice_servers: Vec<String>,
    /// Upper bound for an invitation to be answered.
    pub call_timeout: Duration,
    /// Upper bound for a renegotiation offer to be answered.
    pub renegotiation_timeout: Duration,
    /// Answer `incomming:call` without waiting for [`crate::CallCommand::Accept`].
    pub auto_accept: bool,
    /// Publish local tracks right after answering instead of waiting for
    /// [`crate::CallCommand::SendStreams`].
    pub publish_on_accept: bool,
    pub constraints: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                DEFAULT_STUN_ADDR.to_string(),
                DEFAULT_STUN_ADDR_2.to_string(),
            ],
            call_timeout: Duration::from_secs(30),
            renegotiation_timeout: Duration::from_secs(10),
            auto_accept: true,
            publish_on_accept: false,
            constraints: MediaConstraints::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_auto_accept(mut self, auto_accept: bool) -> Self {
        self.auto_accept = auto_accept;
        self
    }

    pub fn with_publish_on_accept(mut self, publish: bool) -> Self {
        self.publish_on_accept = publish;
        self
    }

    pub fn with_timeouts(mut self, call: Duration, renegotiation: Duration) -> Self {
        self.call_timeout = call;
        self.renegotiation_timeout = renegotiation;
        self
    }
}
