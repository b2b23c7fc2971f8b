use crate::{library, playlists, sessions, tracks, users};
use async_trait::async_trait;
use cadence_core::{
    error::Result,
    storage::{AccountStore, CatalogStore, SnapshotStore},
    types::*,
};
use sqlx::SqlitePool;

/// `SQLite`-backed store for the catalog, accounts and player sessions
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    // Tracks
    async fn get_track(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(tracks::get_by_id(&self.pool, id).await?)
    }

    async fn list_tracks(&self) -> Result<Vec<Track>> {
        Ok(tracks::get_all(&self.pool).await?)
    }

    async fn list_tracks_by_owner(&self, owner_id: &UserId) -> Result<Vec<Track>> {
        Ok(tracks::get_by_owner(&self.pool, owner_id).await?)
    }

    async fn get_tracks(&self, ids: &[TrackId]) -> Result<Vec<Track>> {
        Ok(tracks::get_many(&self.pool, ids).await?)
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        Ok(tracks::search(&self.pool, query).await?)
    }

    async fn create_track(&self, track: &Track) -> Result<()> {
        Ok(tracks::create(&self.pool, track).await?)
    }

    async fn update_track(&self, track: &Track) -> Result<()> {
        Ok(tracks::update(&self.pool, track).await?)
    }

    async fn delete_track(&self, id: &TrackId) -> Result<()> {
        Ok(tracks::delete(&self.pool, id).await?)
    }

    // Playlists
    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        Ok(playlists::get_by_id(&self.pool, id).await?)
    }

    async fn list_public_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(playlists::get_public(&self.pool).await?)
    }

    async fn list_featured_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(playlists::get_featured(&self.pool).await?)
    }

    async fn list_playlists_by_owner(&self, owner_id: &UserId) -> Result<Vec<Playlist>> {
        Ok(playlists::get_by_owner(&self.pool, owner_id).await?)
    }

    async fn list_all_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(playlists::get_all(&self.pool).await?)
    }

    async fn create_playlist(&self, playlist: &Playlist) -> Result<()> {
        Ok(playlists::create(&self.pool, playlist).await?)
    }

    async fn save_playlist(&self, playlist: &Playlist) -> Result<()> {
        Ok(playlists::save(&self.pool, playlist).await?)
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        Ok(playlists::delete(&self.pool, id).await?)
    }

    // Liked songs
    async fn add_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool> {
        Ok(library::add(&self.pool, user_id, track_id).await?)
    }

    async fn remove_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool> {
        Ok(library::remove(&self.pool, user_id, track_id).await?)
    }

    async fn liked_track_ids(&self, user_id: &UserId) -> Result<Vec<TrackId>> {
        Ok(library::liked_ids(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn create_user(&self, user: &User, password_hash: &str) -> Result<()> {
        Ok(users::create(&self.pool, user, password_hash).await?)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(users::get_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(users::get_by_email(&self.pool, &normalize_email(email)).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(users::get_all(&self.pool).await?)
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        Ok(users::get_admins(&self.pool).await?)
    }

    async fn count_admins(&self) -> Result<usize> {
        Ok(users::count_admins(&self.pool).await?)
    }

    async fn set_admin(&self, id: &UserId, is_admin: bool) -> Result<()> {
        Ok(users::set_admin(&self.pool, id, is_admin).await?)
    }

    async fn delete_user(&self, id: &UserId) -> Result<()> {
        Ok(users::delete(&self.pool, id).await?)
    }

    async fn password_hash(&self, id: &UserId) -> Result<Option<String>> {
        Ok(users::get_password_hash(&self.pool, id).await?)
    }

    async fn set_password_hash(&self, id: &UserId, hash: &str) -> Result<()> {
        Ok(users::set_password_hash(&self.pool, id, hash).await?)
    }

    async fn reset_challenge(&self, id: &UserId) -> Result<Option<ResetChallenge>> {
        Ok(users::get_reset_challenge(&self.pool, id).await?)
    }

    async fn set_reset_challenge(
        &self,
        id: &UserId,
        challenge: Option<&ResetChallenge>,
    ) -> Result<()> {
        Ok(users::set_reset_challenge(&self.pool, id, challenge).await?)
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn load_snapshot(&self, client_id: &str) -> Result<Option<SessionSnapshot>> {
        Ok(sessions::load_snapshot(&self.pool, client_id).await?)
    }

    async fn save_snapshot(&self, client_id: &str, snapshot: &SessionSnapshot) -> Result<()> {
        Ok(sessions::save_snapshot(&self.pool, client_id, snapshot).await?)
    }

    async fn clear_snapshot(&self, client_id: &str) -> Result<()> {
        Ok(sessions::clear_snapshot(&self.pool, client_id).await?)
    }

    async fn load_recent(&self, client_id: &str) -> Result<Vec<TrackId>> {
        Ok(sessions::load_recent(&self.pool, client_id).await?)
    }

    async fn save_recent(&self, client_id: &str, track_ids: &[TrackId]) -> Result<()> {
        Ok(sessions::save_recent(&self.pool, client_id, track_ids).await?)
    }
}
