//! Playback Events
//!
//! Two directions:
//! - [`TransportEvent`]: edge-triggered callbacks from the audio output
//!   (play/pause/ended/time-update), tagged with the load generation they
//!   belong to.
//! - [`SessionEvent`]: what changed in the session, for UI synchronization.

use crate::types::PlaybackState;
use cadence_core::{RepeatMode, TrackId};
use serde::{Deserialize, Serialize};

/// Callback from the audio output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportEvent {
    /// Load generation the output was playing when it emitted this
    pub generation: u64,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(generation: u64, kind: TransportEventKind) -> Self {
        Self { generation, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TransportEventKind {
    /// Output started (or resumed) audible playback
    Playing,

    /// Output paused
    Paused,

    /// Output reached the end of the track
    Ended,

    /// Periodic position report, seconds
    TimeUpdate { position: f64 },

    /// Metadata loaded, duration in seconds
    Loaded { duration: f64 },
}

/// Events emitted by a playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Playback state changed
    #[serde(rename_all = "camelCase")]
    StateChanged { state: PlaybackState },

    /// A different track became current
    #[serde(rename_all = "camelCase")]
    TrackChanged {
        track_id: TrackId,
        previous_track_id: Option<TrackId>,
        generation: u64,
    },

    /// Track finished playing naturally
    #[serde(rename_all = "camelCase")]
    TrackFinished { track_id: TrackId },

    /// End of a non-repeating queue; the last track stays current
    QueueEnded,

    /// Queue contents or order changed
    QueueChanged { length: usize },

    /// Position update, seconds
    PositionUpdate { position: f64 },

    VolumeChanged { level: f32 },

    ShuffleChanged { enabled: bool },

    RepeatChanged { mode: RepeatMode },

    /// Session closed; queue and snapshot are gone
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_event_wire_format() {
        let kind: TransportEventKind =
            serde_json::from_str(r#"{"event":"timeUpdate","position":12.5}"#).unwrap();
        assert_eq!(kind, TransportEventKind::TimeUpdate { position: 12.5 });

        let kind: TransportEventKind = serde_json::from_str(r#"{"event":"ended"}"#).unwrap();
        assert_eq!(kind, TransportEventKind::Ended);
    }

    #[test]
    fn session_event_is_tagged() {
        let event = SessionEvent::TrackChanged {
            track_id: TrackId::new("t2"),
            previous_track_id: Some(TrackId::new("t1")),
            generation: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "trackChanged");
        assert_eq!(json["trackId"], "t2");
        assert_eq!(json["previousTrackId"], "t1");
    }
}
