/// Multipart form parsing shared by the song and playlist routes
use crate::{
    error::{Result, ServerError},
    services::FileStorage,
};
use axum::{
    body::Bytes,
    http::{header, HeaderMap},
};
use cadence_core::types::{AssetKind, AssetUpload, TrackId};
use std::{collections::HashMap, str::FromStr};

/// Text fields plus validated `cover` / `audio` uploads
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<AssetKind, AssetUpload>,
}

impl UploadForm {
    /// Parse a `multipart/form-data` body
    ///
    /// Uploads are type- and size-checked here, before anything touches disk.
    pub async fn parse(headers: &HeaderMap, body: Bytes, storage: &FileStorage) -> Result<Self> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ServerError::BadRequest("Missing Content-Type".to_string()))?;

        if !content_type.starts_with("multipart/form-data") {
            return Err(ServerError::BadRequest(
                "Expected multipart/form-data".to_string(),
            ));
        }

        let boundary = multer::parse_boundary(content_type)
            .map_err(|_| ServerError::BadRequest("Missing boundary".to_string()))?;

        // Convert Bytes to a stream for multer
        let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            let kind = match name.as_str() {
                "cover" | "coverImage" => Some(AssetKind::Cover),
                "audio" | "audioFile" => Some(AssetKind::Audio),
                _ => None,
            };

            match kind {
                Some(kind) => {
                    let file_name = field.file_name().unwrap_or("upload").to_string();
                    let data = field.bytes().await.map_err(|e| {
                        ServerError::BadRequest(format!("Failed to read file: {}", e))
                    })?;
                    let upload = AssetUpload::new(file_name, data.to_vec());
                    storage.validate(kind, &upload)?;
                    form.files.insert(kind, upload);
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        ServerError::BadRequest(format!("Failed to read field {}: {}", name, e))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank counts as absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// `"true"` / `"false"`; anything else counts as absent
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.text(name)?.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| ServerError::BadRequest(format!("{} must be a number", name)))
            })
            .transpose()
    }

    /// Song ids sent as a JSON array string
    pub fn track_ids(&self, name: &str) -> Result<Option<Vec<TrackId>>> {
        self.text(name)
            .map(|raw| {
                serde_json::from_str::<Vec<TrackId>>(&raw).map_err(|_| {
                    ServerError::BadRequest(format!("{} must be a JSON array of ids", name))
                })
            })
            .transpose()
    }

    pub fn take_file(&mut self, kind: AssetKind) -> Option<AssetUpload> {
        self.files.remove(&kind)
    }
}
