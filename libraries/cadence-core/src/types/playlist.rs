/// Playlist domain types
use crate::error::{CoreError, Result};
use crate::types::{AssetRef, Caller, PlaylistId, TrackId, TrackSummary, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Named, ordered list of tracks
///
/// Invariant: `songs` never contains the same id twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub description: String,
    pub cover_ref: AssetRef,
    pub songs: Vec<TrackId>,
    pub owner_id: UserId,
    pub is_public: bool,

    /// Admin-curated; independent of `is_public`
    pub is_featured: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    /// Public playlists, featured playlists and the owner's own playlists are
    /// visible. Admins see everything.
    pub fn is_visible_to(&self, caller: Option<&Caller>) -> bool {
        if self.is_public || self.is_featured {
            return true;
        }
        caller.is_some_and(|c| c.can_manage(&self.owner_id))
    }

    /// Mutations require ownership or admin privilege
    pub fn ensure_editable_by(&self, caller: &Caller, action: &str) -> Result<()> {
        if caller.can_manage(&self.owner_id) {
            Ok(())
        } else {
            Err(CoreError::unauthorized(format!(
                "Not authorized to {} this playlist",
                action
            )))
        }
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.songs.contains(track_id)
    }

    /// Append a track. Rejects duplicates without touching the list.
    pub fn add_track(&mut self, track_id: TrackId) -> Result<()> {
        if self.contains(&track_id) {
            return Err(CoreError::invalid_state("Song already in playlist"));
        }
        self.songs.push(track_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Filter a track out. Succeeds whether or not it was present.
    pub fn remove_track(&mut self, track_id: &TrackId) -> bool {
        let before = self.songs.len();
        self.songs.retain(|id| id != track_id);
        self.updated_at = Utc::now();
        self.songs.len() != before
    }
}

/// Collapse repeated ids, keeping the first occurrence
pub fn dedupe_track_ids(ids: Vec<TrackId>) -> Vec<TrackId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Fields for a new playlist; the cover travels separately
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub songs: Vec<TrackId>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_featured: bool,
}

impl NewPlaylist {
    /// Name and description are required
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid_input("name is required"));
        }
        if self.description.trim().is_empty() {
            return Err(CoreError::invalid_input("description is required"));
        }
        Ok(())
    }

    pub fn into_playlist(self, owner_id: UserId, cover_ref: AssetRef) -> Playlist {
        let now = Utc::now();
        Playlist {
            id: PlaylistId::generate(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            cover_ref,
            songs: dedupe_track_ids(self.songs),
            owner_id,
            is_public: self.is_public,
            is_featured: self.is_featured,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial playlist update; only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPatch {
    pub name: Option<String>,
    pub description: Option<String>,

    /// Replaces the whole ordered list (not a merge)
    pub songs: Option<Vec<TrackId>>,

    pub is_public: Option<bool>,
    pub is_featured: Option<bool>,
}

impl PlaylistPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.songs.is_none()
            && self.is_public.is_none()
            && self.is_featured.is_none()
    }

    /// Apply to a copy of `playlist`
    pub fn apply_to(&self, playlist: &Playlist) -> Result<Playlist> {
        let mut updated = playlist.clone();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CoreError::invalid_input("name cannot be empty"));
            }
            updated.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(CoreError::invalid_input("description cannot be empty"));
            }
            updated.description = description.trim().to_string();
        }
        if let Some(songs) = &self.songs {
            updated.songs = dedupe_track_ids(songs.clone());
        }
        if let Some(is_public) = self.is_public {
            updated.is_public = is_public;
        }
        if let Some(is_featured) = self.is_featured {
            updated.is_featured = is_featured;
        }
        updated.updated_at = Utc::now();
        Ok(updated)
    }
}

/// Playlist with its songs resolved against the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetails {
    #[serde(flatten)]
    pub playlist: Playlist,

    /// Resolved songs in playlist order; unresolvable ids are dropped
    pub tracks: Vec<TrackSummary>,
}
