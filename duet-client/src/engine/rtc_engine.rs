use crate::config::ClientConfig;
use crate::engine::{EngineEvent, EngineEventSender, EngineFactory, PeerEngine};
use crate::error::CallError;
use crate::media::{MediaStream, MediaTrack, TrackKind};
use async_trait::async_trait;
use duet_core::{SdpKind, SessionDescription};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// A capture track backed by a webrtc-rs sample track.
pub struct RtcLocalTrack {
    track: Arc<TrackLocalStaticSample>,
    kind: TrackKind,
    live: AtomicBool,
}

impl RtcLocalTrack {
    pub fn new(track: Arc<TrackLocalStaticSample>, kind: TrackKind) -> Self {
        Self {
            track,
            kind,
            live: AtomicBool::new(true),
        }
    }

    pub fn sample_track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }
}

impl MediaTrack for RtcLocalTrack {
    fn id(&self) -> String {
        self.track.id().to_owned()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            debug!("Stopped local {} track {}", self.kind, self.track.id());
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

pub struct RtcRemoteTrack {
    track: Arc<TrackRemote>,
    live: AtomicBool,
}

impl RtcRemoteTrack {
    pub fn new(track: Arc<TrackRemote>) -> Self {
        Self {
            track,
            live: AtomicBool::new(true),
        }
    }

    pub fn inner(&self) -> &Arc<TrackRemote> {
        &self.track
    }
}

impl MediaTrack for RtcRemoteTrack {
    fn id(&self) -> String {
        self.track.id()
    }

    fn kind(&self) -> TrackKind {
        match self.track.kind() {
            RTPCodecType::Audio => TrackKind::Audio,
            _ => TrackKind::Video,
        }
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

pub struct RtcEngineFactory {
    ice_servers: Vec<String>,
}

impl RtcEngineFactory {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            ice_servers: config.ice_servers.clone(),
        }
    }
}

#[async_trait]
impl EngineFactory for RtcEngineFactory {
    type Engine = RtcEngine;

    async fn create(
        &self,
        events: EngineEventSender<RtcRemoteTrack>,
    ) -> Result<RtcEngine, CallError> {
        RtcEngine::new(&self.ice_servers, events).await
    }
}

/// [`PeerEngine`] on top of a webrtc-rs peer connection.
pub struct RtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
    /// SDP of the local offer still waiting for an answer.
    pending_offer: Mutex<Option<String>>,
}

impl RtcEngine {
    pub async fn new(
        ice_servers: &[String],
        events: EngineEventSender<RtcRemoteTrack>,
    ) -> Result<Self, CallError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(CallError::engine)?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(CallError::engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: ice_servers.to_vec(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(config)
                .await
                .map_err(CallError::engine)?,
        );

        let negotiation_events = events.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let events = negotiation_events.clone();
            Box::pin(async move {
                debug!("Engine requests negotiation");
                events.send(EngineEvent::NegotiationNeeded);
            })
        }));

        let track_events = events.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let events = track_events.clone();
            Box::pin(async move {
                info!("Remote {} track {} arrived", track.kind(), track.id());
                let stream_id = track.stream_id();
                let remote = Arc::new(RtcRemoteTrack::new(track));
                events.send(EngineEvent::RemoteTrack(MediaStream::new(
                    stream_id,
                    vec![remote],
                )));
            })
        }));

        let state_events = events;
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!("Peer connection state: {}", state);
                    if state == RTCPeerConnectionState::Failed {
                        events.send(EngineEvent::ConnectionFailed);
                    }
                })
            },
        ));

        Ok(Self {
            peer_connection,
            pending_offer: Mutex::new(None),
        })
    }
}

impl RtcEngine {
    fn pending_offer_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.pending_offer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription, CallError> {
    let parsed = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp),
    };
    parsed.map_err(|e| CallError::MalformedDescription(e.to_string()))
}

fn from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription, CallError> {
    match desc.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(desc.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(desc.sdp)),
        other => Err(CallError::Engine(format!(
            "engine produced a {:?} description",
            other
        ))),
    }
}

#[async_trait]
impl PeerEngine for RtcEngine {
    type LocalTrack = RtcLocalTrack;
    type RemoteTrack = RtcRemoteTrack;

    async fn create_offer(&self) -> Result<SessionDescription, CallError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(CallError::engine)?;
        from_rtc(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, CallError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(CallError::engine)?;
        from_rtc(answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), CallError> {
        let offer_sdp = desc.is_offer().then(|| desc.sdp.clone());
        *self.pending_offer_slot() = offer_sdp;
        self.peer_connection
            .set_local_description(to_rtc(desc)?)
            .await
            .map_err(CallError::engine)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), CallError> {
        if desc.is_answer() {
            self.pending_offer_slot().take();
        }
        self.peer_connection
            .set_remote_description(to_rtc(desc)?)
            .await
            .map_err(|e| CallError::MalformedDescription(e.to_string()))
    }

    async fn rollback(&self) -> Result<(), CallError> {
        let pending = self.pending_offer_slot().take();
        let Some(sdp) = pending else {
            return Err(CallError::invalid_state("rollback", "no local offer is pending"));
        };

        // RTCSessionDescription has no public rollback constructor, and an
        // empty sdp is rejected for local descriptions.
        let rollback: RTCSessionDescription =
            serde_json::from_value(serde_json::json!({ "type": "rollback", "sdp": sdp }))
                .map_err(CallError::engine)?;
        self.peer_connection
            .set_local_description(rollback)
            .await
            .map_err(CallError::engine)
    }

    async fn publish(&self, stream: &MediaStream<RtcLocalTrack>) -> Result<(), CallError> {
        for track in stream.tracks() {
            let local: Arc<dyn TrackLocal + Send + Sync> = track.sample_track();
            let sender = self
                .peer_connection
                .add_track(local)
                .await
                .map_err(CallError::engine)?;

            // RTCP has to be read for interceptors to run.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }
        info!("Published {} track(s) of stream {}", stream.tracks().len(), stream.id());
        Ok(())
    }

    async fn close(&self) -> Result<(), CallError> {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Closing peer connection failed: {}", e);
            return Err(CallError::engine(e));
        }
        Ok(())
    }
}
