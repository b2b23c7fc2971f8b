mod asset;
mod ids;
mod playlist;
mod session;
mod track;
mod user;

pub use asset::{AssetKind, AssetRef, AssetUpload};
pub use ids::{PlaylistId, TrackId, UserId};
pub use playlist::{dedupe_track_ids, NewPlaylist, Playlist, PlaylistDetails, PlaylistPatch};
pub use session::{RepeatMode, SessionSnapshot};
pub use track::{NewTrack, Track, TrackPatch, TrackSummary};
pub use user::{normalize_email, Caller, ResetChallenge, User};
