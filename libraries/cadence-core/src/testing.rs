//! In-memory stores for unit tests

use crate::error::{CoreError, Result};
use crate::storage::{AssetStore, CatalogStore};
use crate::types::{AssetKind, AssetRef, AssetUpload, Playlist, PlaylistId, Track, TrackId, UserId};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryCatalog {
    tracks: Mutex<Vec<Track>>,
    playlists: Mutex<Vec<Playlist>>,
    liked: Mutex<HashMap<UserId, BTreeSet<TrackId>>>,
}

impl MemoryCatalog {
    pub fn playlist(&self, id: &PlaylistId) -> Option<Playlist> {
        self.playlists.lock().unwrap().iter().find(|p| &p.id == id).cloned()
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.lock().unwrap().len()
    }

    pub fn liked(&self, user_id: &UserId) -> BTreeSet<TrackId> {
        self.liked
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get_track(&self, id: &TrackId) -> Result<Option<Track>> {
        Ok(self.tracks.lock().unwrap().iter().find(|t| &t.id == id).cloned())
    }

    async fn list_tracks(&self) -> Result<Vec<Track>> {
        let mut tracks = self.tracks.lock().unwrap().clone();
        tracks.reverse();
        Ok(tracks)
    }

    async fn list_tracks_by_owner(&self, owner_id: &UserId) -> Result<Vec<Track>> {
        Ok(self
            .tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_tracks(&self, ids: &[TrackId]) -> Result<Vec<Track>> {
        let wanted: HashSet<&TrackId> = ids.iter().collect();
        Ok(self
            .tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| wanted.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        let q = query.to_lowercase();
        Ok(self
            .tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&q) || t.artist.to_lowercase().contains(&q))
            .cloned()
            .collect())
    }

    async fn create_track(&self, track: &Track) -> Result<()> {
        self.tracks.lock().unwrap().push(track.clone());
        Ok(())
    }

    async fn update_track(&self, track: &Track) -> Result<()> {
        let mut tracks = self.tracks.lock().unwrap();
        let slot = tracks
            .iter_mut()
            .find(|t| t.id == track.id)
            .ok_or_else(|| CoreError::not_found("Track", track.id.as_str()))?;
        *slot = track.clone();
        Ok(())
    }

    async fn delete_track(&self, id: &TrackId) -> Result<()> {
        self.tracks.lock().unwrap().retain(|t| &t.id != id);
        for playlist in self.playlists.lock().unwrap().iter_mut() {
            playlist.songs.retain(|s| s != id);
        }
        for set in self.liked.lock().unwrap().values_mut() {
            set.remove(id);
        }
        Ok(())
    }

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<Playlist>> {
        Ok(self.playlist(id))
    }

    async fn list_public_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_public)
            .cloned()
            .collect())
    }

    async fn list_featured_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_featured)
            .cloned()
            .collect())
    }

    async fn list_playlists_by_owner(&self, owner_id: &UserId) -> Result<Vec<Playlist>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .filter(|p| &p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_all_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(self.playlists.lock().unwrap().clone())
    }

    async fn create_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.playlists.lock().unwrap().push(playlist.clone());
        Ok(())
    }

    async fn save_playlist(&self, playlist: &Playlist) -> Result<()> {
        let mut playlists = self.playlists.lock().unwrap();
        let slot = playlists
            .iter_mut()
            .find(|p| p.id == playlist.id)
            .ok_or_else(|| CoreError::not_found("Playlist", playlist.id.as_str()))?;
        *slot = playlist.clone();
        Ok(())
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        self.playlists.lock().unwrap().retain(|p| &p.id != id);
        Ok(())
    }

    async fn add_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool> {
        Ok(self
            .liked
            .lock()
            .unwrap()
            .entry(user_id.clone())
            .or_default()
            .insert(track_id.clone()))
    }

    async fn remove_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<bool> {
        Ok(self
            .liked
            .lock()
            .unwrap()
            .get_mut(user_id)
            .is_some_and(|set| set.remove(track_id)))
    }

    async fn liked_track_ids(&self, user_id: &UserId) -> Result<Vec<TrackId>> {
        Ok(self.liked(user_id).into_iter().collect())
    }
}

#[derive(Default)]
pub struct MemoryAssets {
    stored: Mutex<HashSet<AssetRef>>,
    counter: Mutex<u64>,
}

impl MemoryAssets {
    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.stored.lock().unwrap().contains(asset)
    }

    pub fn count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetStore for MemoryAssets {
    async fn store(&self, kind: AssetKind, upload: AssetUpload) -> Result<AssetRef> {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        let asset = AssetRef::new(format!(
            "/uploads/{}/{}-{}",
            kind.directory(),
            counter,
            upload.file_name
        ));
        self.stored.lock().unwrap().insert(asset.clone());
        Ok(asset)
    }

    async fn delete(&self, asset: &AssetRef) -> Result<()> {
        self.stored.lock().unwrap().remove(asset);
        Ok(())
    }
}
