//! Core types for playback management

use cadence_core::{AssetRef, RepeatMode, Track, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Track information for queue management
///
/// Eagerly copied from the catalog so navigation never touches storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueTrack {
    /// Catalog identifier
    pub id: TrackId,

    pub title: String,
    pub artist: String,
    pub album: String,

    /// Unknown until the output reports it
    pub duration: Option<Duration>,

    pub cover_ref: AssetRef,

    /// What the audio output loads
    pub audio_ref: AssetRef,
}

impl From<&Track> for QueueTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration: track.duration_secs.map(|s| Duration::from_secs(u64::from(s))),
            cover_ref: track.cover_ref.clone(),
            audio_ref: track.audio_ref.clone(),
        }
    }
}

impl From<Track> for QueueTrack {
    fn from(track: Track) -> Self {
        Self::from(&track)
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No track loaded
    Stopped,

    /// Track handed to the output, waiting for it to start
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track (or at the end of a non-repeating queue)
    Paused,
}

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

/// What `previous` does at index 0 when repeat is not `All`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrevAtStart {
    /// Return none and keep the cursor (mirrors `next` at the end)
    #[default]
    Stop,

    /// Clamp to 0 and replay the first track
    Replay,
}

/// Configuration for a playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume (0.0 ..= 1.0, default: 1.0)
    pub volume: f32,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Boundary policy for `previous` (default: Stop)
    pub prev_at_start: PrevAtStart,

    /// Recently-played log size (default: 20)
    pub recent_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            repeat: RepeatMode::Off,
            prev_at_start: PrevAtStart::Stop,
            recent_capacity: crate::recent::DEFAULT_CAPACITY,
        }
    }
}
