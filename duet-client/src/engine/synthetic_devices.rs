use crate::engine::RtcLocalTrack;
use crate::error::CallError;
use crate::media::{MediaConstraints, MediaDevices, MediaStream, MediaTrack, TrackKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// One Opus frame of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const AUDIO_FRAME: Duration = Duration::from_millis(20);

/// Capture devices for hosts without a camera or microphone.
///
/// Audio tracks stream Opus silence until stopped. Video tracks are
/// negotiated but carry no frames.
#[derive(Debug, Clone, Default)]
pub struct SyntheticDevices {
    label: String,
}

impl SyntheticDevices {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    fn audio_track(&self, stream_id: &str) -> Arc<RtcLocalTrack> {
        let sample_track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            format!("{}-audio", self.label),
            stream_id.to_owned(),
        ));
        let track = Arc::new(RtcLocalTrack::new(sample_track, TrackKind::Audio));
        spawn_silence(track.clone());
        track
    }

    fn video_track(&self, stream_id: &str) -> Arc<RtcLocalTrack> {
        let sample_track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            format!("{}-video", self.label),
            stream_id.to_owned(),
        ));
        Arc::new(RtcLocalTrack::new(sample_track, TrackKind::Video))
    }
}

fn spawn_silence(track: Arc<RtcLocalTrack>) {
    tokio::spawn(async move {
        let sample_track = track.sample_track();
        let mut ticker = tokio::time::interval(AUDIO_FRAME);
        while track.is_live() {
            ticker.tick().await;
            let sample = Sample {
                data: Bytes::from_static(&OPUS_SILENCE),
                duration: AUDIO_FRAME,
                ..Default::default()
            };
            if let Err(e) = sample_track.write_sample(&sample).await {
                debug!("Silence writer for {} stopped: {}", track.id(), e);
                break;
            }
        }
    });
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    type Track = RtcLocalTrack;

    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaStream<RtcLocalTrack>, CallError> {
        if !constraints.audio && !constraints.video {
            return Err(CallError::NoDevice("an empty constraint set".into()));
        }

        let stream_id = format!("{}-stream", self.label);
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(self.audio_track(&stream_id));
        }
        if constraints.video {
            tracks.push(self.video_track(&stream_id));
        }

        info!("Captured {} synthetic track(s) for {}", tracks.len(), self.label);
        Ok(MediaStream::new(stream_id, tracks))
    }
}
