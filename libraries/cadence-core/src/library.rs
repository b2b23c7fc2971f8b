//! Library & playlist mutation rules
//!
//! `Library` sits between an adapter (HTTP handlers, CLI) and the boundary
//! stores. It enforces ownership, visibility, membership and asset rules.
//! Every rejection happens before anything is written, so a failed call leaves
//! playlists, liked songs and assets as they were.

use crate::error::{CoreError, Result};
use crate::storage::{AssetStore, CatalogStore};
use crate::types::{
    dedupe_track_ids, AssetKind, AssetRef, AssetUpload, Caller, NewPlaylist, NewTrack, Playlist,
    PlaylistDetails, PlaylistId, PlaylistPatch, Track, TrackId, TrackPatch, TrackSummary,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a like request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LikeOutcome {
    Added,
    AlreadyLiked,
}

/// Result of an unlike request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnlikeOutcome {
    Removed,
    NotLiked,
}

/// Catalog, playlist and liked-songs operations with permission checks
#[derive(Clone)]
pub struct Library {
    catalog: Arc<dyn CatalogStore>,
    assets: Arc<dyn AssetStore>,
}

impl Library {
    pub fn new(catalog: Arc<dyn CatalogStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self { catalog, assets }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    // ===== Tracks =====

    pub async fn get_track(&self, id: &TrackId) -> Result<Track> {
        self.catalog
            .get_track(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Track", id.as_str()))
    }

    pub async fn list_tracks(&self) -> Result<Vec<Track>> {
        self.catalog.list_tracks().await
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        let query = query.trim();
        if query.is_empty() {
            return self.catalog.list_tracks().await;
        }
        self.catalog.search_tracks(query).await
    }

    /// Resolve ids in order, silently dropping ids that no longer exist
    ///
    /// A repeated id resolves at every position it appears.
    pub async fn resolve_tracks(&self, ids: &[TrackId]) -> Result<Vec<Track>> {
        let found = self.catalog.get_tracks(ids).await?;
        let by_id: HashMap<TrackId, Track> =
            found.into_iter().map(|t| (t.id.clone(), t)).collect();
        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    /// Admin-only. Both a cover and an audio file are mandatory.
    pub async fn create_track(
        &self,
        caller: &Caller,
        new_track: NewTrack,
        cover: Option<AssetUpload>,
        audio: Option<AssetUpload>,
    ) -> Result<Track> {
        require_admin(caller)?;
        new_track.validate()?;
        let cover = cover.ok_or_else(|| CoreError::asset_required("Cover image is required"))?;
        let audio = audio.ok_or_else(|| CoreError::asset_required("Audio file is required"))?;

        let cover_ref = self.assets.store(AssetKind::Cover, cover).await?;
        let audio_ref = match self.assets.store(AssetKind::Audio, audio).await {
            Ok(r) => r,
            Err(e) => {
                self.discard(&cover_ref).await;
                return Err(e);
            }
        };

        let track = new_track.into_track(caller.user_id.clone(), cover_ref, audio_ref);
        if let Err(e) = self.catalog.create_track(&track).await {
            self.discard(&track.cover_ref).await;
            self.discard(&track.audio_ref).await;
            return Err(e);
        }
        Ok(track)
    }

    /// Admin-only partial edit; replaced assets are deleted once the edit is saved
    pub async fn update_track(
        &self,
        caller: &Caller,
        id: &TrackId,
        patch: TrackPatch,
        cover: Option<AssetUpload>,
        audio: Option<AssetUpload>,
    ) -> Result<Track> {
        require_admin(caller)?;
        let existing = self.get_track(id).await?;
        let mut updated = patch.apply_to(&existing);

        let mut stored = Vec::new();
        if let Some(cover) = cover {
            updated.cover_ref = self.assets.store(AssetKind::Cover, cover).await?;
            stored.push(updated.cover_ref.clone());
        }
        if let Some(audio) = audio {
            match self.assets.store(AssetKind::Audio, audio).await {
                Ok(r) => {
                    updated.audio_ref = r;
                    stored.push(updated.audio_ref.clone());
                }
                Err(e) => {
                    self.discard_all(&stored).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.catalog.update_track(&updated).await {
            self.discard_all(&stored).await;
            return Err(e);
        }

        if updated.cover_ref != existing.cover_ref {
            self.discard(&existing.cover_ref).await;
        }
        if updated.audio_ref != existing.audio_ref {
            self.discard(&existing.audio_ref).await;
        }
        Ok(updated)
    }

    /// Admin-only. Cascades out of playlists and liked songs, then drops both assets.
    pub async fn delete_track(&self, caller: &Caller, id: &TrackId) -> Result<()> {
        require_admin(caller)?;
        let track = self.get_track(id).await?;
        self.catalog.delete_track(id).await?;
        self.discard(&track.cover_ref).await;
        self.discard(&track.audio_ref).await;
        Ok(())
    }

    // ===== Liked songs =====

    pub async fn like_track(&self, caller: &Caller, track_id: &TrackId) -> Result<LikeOutcome> {
        self.get_track(track_id).await?;
        if self.catalog.add_liked(&caller.user_id, track_id).await? {
            Ok(LikeOutcome::Added)
        } else {
            Ok(LikeOutcome::AlreadyLiked)
        }
    }

    pub async fn unlike_track(&self, caller: &Caller, track_id: &TrackId) -> Result<UnlikeOutcome> {
        if self.catalog.remove_liked(&caller.user_id, track_id).await? {
            Ok(UnlikeOutcome::Removed)
        } else {
            Ok(UnlikeOutcome::NotLiked)
        }
    }

    pub async fn liked_tracks(&self, caller: &Caller) -> Result<Vec<Track>> {
        let ids = self.catalog.liked_track_ids(&caller.user_id).await?;
        self.resolve_tracks(&ids).await
    }

    // ===== Playlists =====

    /// Fetch by id, enforcing the visibility rule
    pub async fn get_playlist(
        &self,
        caller: Option<&Caller>,
        id: &PlaylistId,
    ) -> Result<PlaylistDetails> {
        let playlist = self.load_playlist(id).await?;
        if !playlist.is_visible_to(caller) {
            return Err(CoreError::unauthorized("This playlist is private"));
        }
        self.details(playlist).await
    }

    pub async fn list_public_playlists(&self) -> Result<Vec<PlaylistDetails>> {
        let playlists = self.catalog.list_public_playlists().await?;
        self.details_all(playlists).await
    }

    pub async fn list_featured_playlists(&self) -> Result<Vec<PlaylistDetails>> {
        let playlists = self.catalog.list_featured_playlists().await?;
        self.details_all(playlists).await
    }

    pub async fn list_owned_playlists(&self, caller: &Caller) -> Result<Vec<PlaylistDetails>> {
        let playlists = self.catalog.list_playlists_by_owner(&caller.user_id).await?;
        self.details_all(playlists).await
    }

    /// Admin-only view of every playlist
    pub async fn list_all_playlists(&self, caller: &Caller) -> Result<Vec<PlaylistDetails>> {
        require_admin(caller)?;
        let playlists = self.catalog.list_all_playlists().await?;
        self.details_all(playlists).await
    }

    /// Name, description and cover are required; repeated track ids collapse
    pub async fn create_playlist(
        &self,
        caller: &Caller,
        new_playlist: NewPlaylist,
        cover: Option<AssetUpload>,
    ) -> Result<PlaylistDetails> {
        new_playlist.validate()?;
        if new_playlist.is_featured {
            require_admin(caller)?;
        }
        let cover = cover.ok_or_else(|| CoreError::asset_required("Cover image is required"))?;
        let songs = dedupe_track_ids(new_playlist.songs.clone());
        self.ensure_tracks_exist(&songs).await?;

        let cover_ref = self.assets.store(AssetKind::Cover, cover).await?;
        let playlist = new_playlist.into_playlist(caller.user_id.clone(), cover_ref);
        if let Err(e) = self.catalog.create_playlist(&playlist).await {
            self.discard(&playlist.cover_ref).await;
            return Err(e);
        }
        self.details(playlist).await
    }

    /// Partial update by owner or admin; a new cover replaces and deletes the old one
    pub async fn update_playlist(
        &self,
        caller: &Caller,
        id: &PlaylistId,
        patch: PlaylistPatch,
        cover: Option<AssetUpload>,
    ) -> Result<PlaylistDetails> {
        let existing = self.load_playlist(id).await?;
        existing.ensure_editable_by(caller, "edit")?;
        if patch.is_featured.is_some() {
            require_admin(caller)?;
        }
        let mut updated = patch.apply_to(&existing)?;
        if patch.songs.is_some() {
            self.ensure_tracks_exist(&updated.songs).await?;
        }

        if let Some(cover) = cover {
            updated.cover_ref = self.assets.store(AssetKind::Cover, cover).await?;
        }
        if let Err(e) = self.catalog.save_playlist(&updated).await {
            if updated.cover_ref != existing.cover_ref {
                self.discard(&updated.cover_ref).await;
            }
            return Err(e);
        }
        if updated.cover_ref != existing.cover_ref {
            self.discard(&existing.cover_ref).await;
        }
        self.details(updated).await
    }

    /// Append a track; duplicates are rejected
    pub async fn add_track(
        &self,
        caller: &Caller,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<PlaylistDetails> {
        let mut playlist = self.load_playlist(playlist_id).await?;
        playlist.ensure_editable_by(caller, "modify")?;
        self.get_track(track_id).await?;
        playlist.add_track(track_id.clone())?;
        self.catalog.save_playlist(&playlist).await?;
        self.details(playlist).await
    }

    /// Filter a track out; succeeds even if it was not present
    pub async fn remove_track(
        &self,
        caller: &Caller,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<PlaylistDetails> {
        let mut playlist = self.load_playlist(playlist_id).await?;
        playlist.ensure_editable_by(caller, "modify")?;
        playlist.remove_track(track_id);
        self.catalog.save_playlist(&playlist).await?;
        self.details(playlist).await
    }

    pub async fn delete_playlist(&self, caller: &Caller, id: &PlaylistId) -> Result<()> {
        let playlist = self.load_playlist(id).await?;
        playlist.ensure_editable_by(caller, "delete")?;
        self.catalog.delete_playlist(id).await?;
        self.discard(&playlist.cover_ref).await;
        Ok(())
    }

    // ===== Internal =====

    async fn load_playlist(&self, id: &PlaylistId) -> Result<Playlist> {
        self.catalog
            .get_playlist(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Playlist", id.as_str()))
    }

    async fn ensure_tracks_exist(&self, ids: &[TrackId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self.catalog.get_tracks(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|t| &t.id == *id)) {
            return Err(CoreError::not_found("Track", missing.as_str()));
        }
        Ok(())
    }

    async fn details(&self, playlist: Playlist) -> Result<PlaylistDetails> {
        let tracks = self
            .resolve_tracks(&playlist.songs)
            .await?
            .iter()
            .map(TrackSummary::from)
            .collect();
        Ok(PlaylistDetails { playlist, tracks })
    }

    async fn details_all(&self, playlists: Vec<Playlist>) -> Result<Vec<PlaylistDetails>> {
        let mut out = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            out.push(self.details(playlist).await?);
        }
        Ok(out)
    }

    /// Asset cleanup never masks the primary outcome
    async fn discard(&self, asset: &AssetRef) {
        let _ = self.assets.delete(asset).await;
    }

    async fn discard_all(&self, assets: &[AssetRef]) {
        for asset in assets {
            self.discard(asset).await;
        }
    }
}

fn require_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(CoreError::unauthorized(
            "Access denied. Admin privileges required",
        ))
    }
}
