//! Boundary traits for persistence and asset storage
//!
//! Implementations live outside this crate (`cadence-storage` for SQLite,
//! the server for on-disk assets). Everything here is request/response with
//! no retry policy.

use crate::error::Result;
use crate::types::{
    AssetKind, AssetRef, AssetUpload, Playlist, PlaylistId, ResetChallenge, SessionSnapshot,
    Track, TrackId, User, UserId,
};
use async_trait::async_trait;

/// Tracks, playlists and liked-songs sets
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // ========================================================================
    // Tracks
    // ========================================================================

    async fn get_track(&self, id: &TrackId) -> Result<Option<Track>>;

    /// All tracks, newest first
    async fn list_tracks(&self) -> Result<Vec<Track>>;

    async fn list_tracks_by_owner(&self, owner_id: &UserId) -> Result<Vec<Track>>;

    /// Tracks for the given ids, in no particular order; unknown ids are skipped
    async fn get_tracks(&self, ids: &[TrackId]) -> Result<Vec<Track>>;

    /// Case-insensitive substring match on title, artist, album and genre
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>>;

    async fn create_track(&self, track: &Track) -> Result<()>;

    async fn update_track(&self, track: &Track) -> Result<()>;

    /// Delete a track and pull it from every playlist and liked-songs set
    async fn delete_track(&self, id: &TrackId) -> Result<()>;

    // ========================================================================
    // Playlists
    // ========================================================================

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>>;

    /// Public playlists, newest first
    async fn list_public_playlists(&self) -> Result<Vec<Playlist>>;

    async fn list_featured_playlists(&self) -> Result<Vec<Playlist>>;

    async fn list_playlists_by_owner(&self, owner_id: &UserId) -> Result<Vec<Playlist>>;

    async fn list_all_playlists(&self) -> Result<Vec<Playlist>>;

    async fn create_playlist(&self, playlist: &Playlist) -> Result<()>;

    /// Overwrite every field, including the ordered song list
    async fn save_playlist(&self, playlist: &Playlist) -> Result<()>;

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()>;

    // ========================================================================
    // Liked songs
    // ========================================================================

    /// Returns false when the track was already liked
    async fn add_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool>;

    /// Returns false when the track was not liked
    async fn remove_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool>;

    async fn liked_track_ids(&self, user_id: &UserId) -> Result<Vec<TrackId>>;
}

/// User accounts and their credentials
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `InvalidState` when the email is taken
    async fn create_user(&self, user: &User, password_hash: &str) -> Result<()>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Lookup by normalized email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    async fn list_admins(&self) -> Result<Vec<User>>;

    async fn count_admins(&self) -> Result<usize>;

    async fn set_admin(&self, id: &UserId, is_admin: bool) -> Result<()>;

    async fn delete_user(&self, id: &UserId) -> Result<()>;

    async fn password_hash(&self, id: &UserId) -> Result<Option<String>>;

    async fn set_password_hash(&self, id: &UserId, hash: &str) -> Result<()>;

    async fn reset_challenge(&self, id: &UserId) -> Result<Option<ResetChallenge>>;

    /// `None` clears code and expiry together
    async fn set_reset_challenge(
        &self,
        id: &UserId,
        challenge: Option<&ResetChallenge>,
    ) -> Result<()>;
}

/// Cover and audio file storage
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn store(&self, kind: AssetKind, upload: AssetUpload) -> Result<AssetRef>;

    /// Best-effort; a missing asset is not an error
    async fn delete(&self, asset: &AssetRef) -> Result<()>;
}

/// Per-client persistence of the session snapshot and recently-played log
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load_snapshot(&self, client_id: &str) -> Result<Option<SessionSnapshot>>;

    async fn save_snapshot(&self, client_id: &str, snapshot: &SessionSnapshot) -> Result<()>;

    async fn clear_snapshot(&self, client_id: &str) -> Result<()>;

    async fn load_recent(&self, client_id: &str) -> Result<Vec<TrackId>>;

    async fn save_recent(&self, client_id: &str, track_ids: &[TrackId]) -> Result<()>;
}
