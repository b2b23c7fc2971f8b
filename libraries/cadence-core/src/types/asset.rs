/// Asset references for cover images and audio files
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of stored asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Cover,
    Audio,
}

impl AssetKind {
    /// Storage sub-directory for this kind
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Cover => "images",
            Self::Audio => "audio",
        }
    }

    /// Lowercase file extensions accepted for this kind
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Cover => &["jpeg", "jpg", "png", "gif", "webp"],
            Self::Audio => &["mp3", "wav", "ogg", "m4a"],
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cover => write!(f, "cover"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Path-like reference to a stored asset, e.g. `/uploads/images/1700000000-cover.png`
///
/// Resolved against a stable base URL at serve time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw upload handed to an asset store
#[derive(Debug, Clone)]
pub struct AssetUpload {
    /// Client-supplied file name (sanitised by the store)
    pub file_name: String,

    /// File contents
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercased extension of the client file name, if any
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}
