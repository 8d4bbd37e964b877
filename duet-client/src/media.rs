use crate::error::CallError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// A single audio or video track, local or remote.
///
/// `stop` releases the underlying source. Calling it on a track that is no
/// longer live must be harmless.
pub trait MediaTrack: Send + Sync + 'static {
    fn id(&self) -> String;
    fn kind(&self) -> TrackKind;
    fn stop(&self);
    fn is_live(&self) -> bool;
}

/// An ordered group of tracks sharing one stream id.
pub struct MediaStream<T> {
    id: String,
    tracks: Vec<Arc<T>>,
}

impl<T> Clone for MediaStream<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            tracks: self.tracks.clone(),
        }
    }
}

impl<T> fmt::Debug for MediaStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

impl<T> MediaStream<T> {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<T>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<T>] {
        &self.tracks
    }
}

impl<T: MediaTrack> MediaStream<T> {
    /// Adds the tracks of `other` that this stream does not hold yet and
    /// returns how many were added. Stream ids are not compared.
    pub fn merge(&mut self, other: MediaStream<T>) -> usize {
        let mut added = 0;
        for track in other.tracks {
            let id = track.id();
            if self.tracks.iter().any(|t| t.id() == id) {
                continue;
            }
            self.tracks.push(track);
            added += 1;
        }
        added
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Arc<T>> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    /// Stops every live track and returns how many were stopped.
    pub fn stop(&self) -> usize {
        let mut stopped = 0;
        for track in self.tracks.iter().filter(|t| t.is_live()) {
            track.stop();
            stopped += 1;
        }
        stopped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Source of local capture streams.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    type Track: MediaTrack;

    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<MediaStream<Self::Track>, CallError>;
}
