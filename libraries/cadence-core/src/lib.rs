//! Cadence Core
//!
//! Platform-agnostic domain types, boundary traits and library rules for the
//! Cadence music-streaming service.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `User`, `SessionSnapshot`, string ids
//! - **Boundary Traits**: `CatalogStore`, `AccountStore`, `AssetStore`, `SnapshotStore`
//! - **Library Rules**: ownership, visibility and membership checks in `Library`
//! - **Error Handling**: unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cadence_core::types::{AssetRef, Caller, NewPlaylist, TrackId, UserId};
//!
//! let owner = UserId::new("u1");
//! let mut playlist = NewPlaylist {
//!     name: "Road trip".into(),
//!     description: "Loud songs".into(),
//!     songs: vec![TrackId::new("t1"), TrackId::new("t1")],
//!     ..Default::default()
//! }
//! .into_playlist(owner.clone(), AssetRef::new("/uploads/images/cover.png"));
//!
//! assert_eq!(playlist.songs.len(), 1);
//! assert!(playlist.add_track(TrackId::new("t1")).is_err());
//! assert!(!playlist.is_visible_to(Some(&Caller::user(UserId::new("u2")))));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod library;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{CoreError, Result};
pub use library::{Library, LikeOutcome, UnlikeOutcome};
pub use storage::{AccountStore, AssetStore, CatalogStore, SnapshotStore};

pub use types::{
    AssetKind, AssetRef, AssetUpload, Caller, NewPlaylist, NewTrack, Playlist, PlaylistDetails,
    PlaylistId, PlaylistPatch, RepeatMode, ResetChallenge, SessionSnapshot, Track, TrackId,
    TrackPatch, TrackSummary, User, UserId,
};
