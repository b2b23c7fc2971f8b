/// File storage service - cover images and audio files on disk
use crate::error::{Result, ServerError};
use async_trait::async_trait;
use cadence_core::{
    storage::AssetStore,
    types::{AssetKind, AssetRef, AssetUpload},
    CoreError,
};
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// URL prefix every stored asset reference starts with
pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
    max_image_bytes: usize,
    max_audio_bytes: usize,
}

impl FileStorage {
    pub fn new(base_path: PathBuf, max_image_bytes: usize, max_audio_bytes: usize) -> Self {
        Self {
            base_path,
            max_image_bytes,
            max_audio_bytes,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Initialize storage directories
    pub async fn initialize(&self) -> Result<()> {
        for kind in [AssetKind::Cover, AssetKind::Audio] {
            fs::create_dir_all(self.base_path.join(kind.directory())).await?;
        }
        Ok(())
    }

    pub fn max_bytes(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Cover => self.max_image_bytes,
            AssetKind::Audio => self.max_audio_bytes,
        }
    }

    /// Check type and size before anything is written
    pub fn validate(&self, kind: AssetKind, upload: &AssetUpload) -> Result<()> {
        let type_error = || match kind {
            AssetKind::Cover => ServerError::BadRequest("Only image files are allowed!".to_string()),
            AssetKind::Audio => ServerError::BadRequest("Only audio files are allowed!".to_string()),
        };

        let extension = upload.extension().ok_or_else(type_error)?;
        if !kind.allowed_extensions().contains(&extension.as_str()) {
            return Err(type_error());
        }

        // Extension and guessed media type must agree on the family
        let family = match kind {
            AssetKind::Cover => "image",
            AssetKind::Audio => "audio",
        };
        let guessed = mime_guess::from_ext(&extension).first();
        if guessed.is_some_and(|mime| mime.type_().as_str() != family) {
            return Err(type_error());
        }

        let limit = self.max_bytes(kind);
        if upload.bytes.len() > limit {
            return Err(ServerError::PayloadTooLarge(format!(
                "File too large (max {} MB)",
                limit / (1024 * 1024)
            )));
        }
        Ok(())
    }

    /// Write an upload and return its reference
    pub async fn store_upload(&self, kind: AssetKind, upload: AssetUpload) -> Result<AssetRef> {
        self.validate(kind, &upload)?;

        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(&upload.file_name)
        );
        let dir = self.base_path.join(kind.directory());
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&file_name), &upload.bytes).await?;

        tracing::debug!(kind = %kind, file = %file_name, bytes = upload.bytes.len(), "Stored asset");
        Ok(AssetRef::new(format!(
            "{UPLOADS_PREFIX}/{}/{file_name}",
            kind.directory()
        )))
    }

    /// Map a reference back to a path under the storage root
    ///
    /// `None` for references outside `/uploads` or that try to escape it.
    pub fn resolve(&self, asset: &AssetRef) -> Option<PathBuf> {
        let relative = asset
            .as_str()
            .strip_prefix(UPLOADS_PREFIX)?
            .trim_start_matches('/');
        let relative = Path::new(relative);

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.base_path.join(relative))
    }

    /// Best-effort removal; missing files are fine
    pub async fn remove(&self, asset: &AssetRef) -> Result<()> {
        let Some(path) = self.resolve(asset) else {
            tracing::warn!(asset = %asset, "Refusing to delete asset outside upload dir");
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AssetStore for FileStorage {
    async fn store(&self, kind: AssetKind, upload: AssetUpload) -> cadence_core::Result<AssetRef> {
        self.store_upload(kind, upload).await.map_err(|e| match e {
            ServerError::BadRequest(msg) | ServerError::PayloadTooLarge(msg) => {
                CoreError::invalid_input(msg)
            }
            other => CoreError::storage(other.to_string()),
        })
    }

    async fn delete(&self, asset: &AssetRef) -> cadence_core::Result<()> {
        if let Err(e) = self.remove(asset).await {
            tracing::warn!(asset = %asset, "Failed to delete asset: {}", e);
        }
        Ok(())
    }
}

/// Keep only the final path segment, drop `..`, turn whitespace runs into `-`
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = base.replace("..", "");
    let dashed = cleaned.split_whitespace().collect::<Vec<_>>().join("-");

    if dashed.is_empty() || dashed.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        dashed
    }
}
