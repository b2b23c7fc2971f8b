/// User domain types
use crate::types::{TrackId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User account
///
/// The credential never lives on this type; storage keeps it beside the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,

    /// Unique, stored lowercased and trimmed
    pub email: String,

    pub is_admin: bool,

    /// Liked songs (order irrelevant)
    #[serde(default)]
    pub liked_songs: BTreeSet<TrackId>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new non-admin user
    pub fn new(name: impl Into<String>, email: &str) -> Self {
        Self {
            id: UserId::generate(),
            name: name.into(),
            email: normalize_email(email),
            is_admin: false,
            liked_songs: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Add to liked songs. Returns false when already present.
    pub fn like(&mut self, track_id: TrackId) -> bool {
        self.liked_songs.insert(track_id)
    }

    /// Remove from liked songs. Returns false when absent.
    pub fn unlike(&mut self, track_id: &TrackId) -> bool {
        self.liked_songs.remove(track_id)
    }

    pub fn has_liked(&self, track_id: &TrackId) -> bool {
        self.liked_songs.contains(track_id)
    }

    /// Identity used for permission checks
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.id.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// Emails compare case-insensitively and ignore surrounding whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Who is performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Owner or admin
    pub fn can_manage(&self, owner_id: &UserId) -> bool {
        self.is_admin || &self.user_id == owner_id
    }
}

/// Outstanding password-reset challenge
///
/// Code and expiry are always set and cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetChallenge {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetChallenge {
    /// Code matches and has not expired at `now`
    pub fn accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.code == code.trim() && now <= self.expires_at
    }
}
