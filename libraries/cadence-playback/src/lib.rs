//! Cadence - Playback Management
//!
//! Platform-agnostic queue and playback session for Cadence.
//!
//! This crate provides:
//! - Queue engine (load, play-single, next/previous, shuffle, repeat)
//! - Playback session bound to one audio output, with load generations
//! - Session snapshots for resuming across reloads
//! - Recently-played log (bounded, deduplicated)
//! - Volume control (0.0-1.0, mute/unmute)
//!
//! # Architecture
//!
//! `cadence-playback` is completely platform-agnostic:
//! - No dependency on an async runtime
//! - No dependency on cadence-storage (database)
//! - The audio output is provided via the [`AudioOutput`] trait
//!
//! Hosts own one [`PlaybackSession`] per client and feed it commands and
//! [`TransportEvent`]s in order.
//!
//! # Example: Queue navigation
//!
//! ```rust
//! use cadence_core::{AssetRef, RepeatMode, TrackId};
//! use cadence_playback::{NullOutput, PlaybackConfig, PlaybackSession, QueueTrack};
//!
//! let track = |id: &str| QueueTrack {
//!     id: TrackId::new(id),
//!     title: id.to_string(),
//!     artist: "Artist".to_string(),
//!     album: "Album".to_string(),
//!     duration: None,
//!     cover_ref: AssetRef::new("/uploads/images/cover.png"),
//!     audio_ref: AssetRef::new(format!("/uploads/audio/{}.mp3", id)),
//! };
//!
//! let mut session = PlaybackSession::new(PlaybackConfig::default(), Box::new(NullOutput::new()));
//! session.load_queue(vec![track("a"), track("b")], 0, false).unwrap();
//!
//! assert_eq!(session.next().unwrap().unwrap().id.as_str(), "b");
//! // End of a non-repeating queue
//! assert!(session.next().unwrap().is_none());
//!
//! assert_eq!(session.cycle_repeat(), RepeatMode::All);
//! assert_eq!(session.next().unwrap().unwrap().id.as_str(), "a");
//! ```

mod error;
mod events;
mod output;
mod queue;
pub mod recent;
mod session;
pub mod shuffle;
pub mod types;
mod volume;

// Public exports
pub use error::{PlaybackError, Result};
pub use events::{SessionEvent, TransportEvent, TransportEventKind};
pub use output::{AudioOutput, NullOutput, OutputState};
pub use queue::Queue;
pub use recent::{record_play, RecentlyPlayed};
pub use session::{PlaybackSession, SessionStatus};
pub use types::{Direction, PlaybackConfig, PlaybackState, PrevAtStart, QueueTrack};
pub use volume::Volume;
