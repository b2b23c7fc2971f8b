/// Track domain type
use crate::error::{CoreError, Result};
use crate::types::{AssetRef, TrackId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A song in the catalog
///
/// Immutable once created except through an explicit edit. Deleting a track
/// removes it from every playlist and every liked-songs set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,

    /// Free-form release date as entered by the curator
    pub date: Option<String>,

    pub release_year: Option<i32>,

    /// Length in seconds, if known
    pub duration_secs: Option<u32>,

    pub cover_ref: AssetRef,
    pub audio_ref: AssetRef,

    /// Creator of the track
    pub owner_id: UserId,

    pub created_at: DateTime<Utc>,
}

/// Text fields for a new track; the assets travel separately
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub duration_secs: Option<u32>,
}

impl NewTrack {
    /// Title, artist, album and genre are required
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("artist", &self.artist),
            ("album", &self.album),
            ("genre", &self.genre),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::invalid_input(format!("{} is required", field)));
            }
        }
        Ok(())
    }

    /// Materialize into a track with freshly stored assets
    pub fn into_track(self, owner_id: UserId, cover_ref: AssetRef, audio_ref: AssetRef) -> Track {
        Track {
            id: TrackId::generate(),
            title: self.title.trim().to_string(),
            artist: self.artist.trim().to_string(),
            album: self.album.trim().to_string(),
            genre: self.genre.trim().to_string(),
            date: self.date,
            release_year: self.release_year,
            duration_secs: self.duration_secs,
            cover_ref,
            audio_ref,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// Partial edit of a track; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    pub release_year: Option<i32>,
    pub duration_secs: Option<u32>,
}

impl TrackPatch {
    /// Apply the patch to a copy of `track`
    ///
    /// Empty strings for required fields are ignored rather than blanking the field.
    pub fn apply_to(&self, track: &Track) -> Track {
        let mut updated = track.clone();
        let pick = |candidate: &Option<String>, current: &mut String| {
            if let Some(value) = candidate {
                if !value.trim().is_empty() {
                    *current = value.trim().to_string();
                }
            }
        };
        pick(&self.title, &mut updated.title);
        pick(&self.artist, &mut updated.artist);
        pick(&self.album, &mut updated.album);
        pick(&self.genre, &mut updated.genre);
        if self.date.is_some() {
            updated.date.clone_from(&self.date);
        }
        if self.release_year.is_some() {
            updated.release_year = self.release_year;
        }
        if self.duration_secs.is_some() {
            updated.duration_secs = self.duration_secs;
        }
        updated
    }
}

/// Compact track view embedded in playlist responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover_ref: AssetRef,
    pub audio_ref: AssetRef,
    pub duration_secs: Option<u32>,
}

impl From<&Track> for TrackSummary {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            cover_ref: track.cover_ref.clone(),
            audio_ref: track.audio_ref.clone(),
            duration_secs: track.duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_track() -> NewTrack {
        NewTrack {
            title: "Song".into(),
            artist: "Artist".into(),
            album: "Album".into(),
            genre: "Pop".into(),
            ..Default::default()
        }
    }

    #[test]
    fn validate_requires_text_fields() {
        assert!(new_track().validate().is_ok());

        let mut missing = new_track();
        missing.genre = "  ".into();
        let err = missing.validate().unwrap_err();
        assert!(err.to_string().contains("genre"));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let track = new_track().into_track(
            UserId::new("u1"),
            AssetRef::new("/uploads/images/c.png"),
            AssetRef::new("/uploads/audio/a.mp3"),
        );
        let patch = TrackPatch {
            title: Some("Renamed".into()),
            artist: Some(String::new()),
            duration_secs: Some(200),
            ..Default::default()
        };

        let updated = patch.apply_to(&track);
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.artist, "Artist");
        assert_eq!(updated.album, "Album");
        assert_eq!(updated.duration_secs, Some(200));
        assert_eq!(updated.id, track.id);
    }
}
