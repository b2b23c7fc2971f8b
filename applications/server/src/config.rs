/// Server configuration
use crate::error::{Result, ServerError};
use cadence_playback::{PlaybackConfig, PrevAtStart};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_uploads")]
    pub uploads: UploadSettings,

    #[serde(default = "default_library")]
    pub library: LibrarySettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_reset")]
    pub reset: ResetSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Root for `images/` and `audio/`, served at `/uploads`
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadSettings {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Answer 400 to liking a liked song or unliking an absent one
    #[serde(default = "default_reject_redundant_likes")]
    pub reject_redundant_likes: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default)]
    pub prev_at_start: PrevAtStart,

    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,

    /// Maximum number of live client sessions
    #[serde(default = "default_idle_session_limit")]
    pub idle_session_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResetSettings {
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: i64,
}

impl PlaybackSettings {
    /// Settings for a freshly created session
    pub fn session_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            prev_at_start: self.prev_at_start,
            recent_capacity: self.recent_capacity,
            ..PlaybackConfig::default()
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (or `path`) and environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if path.is_some() {
            return Err(ServerError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        // Override with environment variables, e.g. CADENCE_SERVER__PORT=9000
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.is_empty() {
            return Err(ServerError::Config(
                "Database URL is required (set CADENCE_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        if self.uploads.max_image_bytes == 0 || self.uploads.max_audio_bytes == 0 {
            return Err(ServerError::Config(
                "Upload size limits must be positive".to_string(),
            ));
        }

        if self.playback.recent_capacity == 0 {
            return Err(ServerError::Config(
                "playback.recent_capacity must be at least 1".to_string(),
            ));
        }

        if self.playback.idle_session_limit == 0 {
            return Err(ServerError::Config(
                "playback.idle_session_limit must be at least 1".to_string(),
            ));
        }

        if self.reset.code_ttl_minutes <= 0 {
            return Err(ServerError::Config(
                "reset.code_ttl_minutes must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
        upload_dir: default_upload_dir(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/cadence.db".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_uploads() -> UploadSettings {
    UploadSettings {
        max_image_bytes: default_max_image_bytes(),
        max_audio_bytes: default_max_audio_bytes(),
    }
}

fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_audio_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_library() -> LibrarySettings {
    LibrarySettings {
        reject_redundant_likes: default_reject_redundant_likes(),
    }
}

fn default_reject_redundant_likes() -> bool {
    true
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        prev_at_start: PrevAtStart::default(),
        recent_capacity: default_recent_capacity(),
        idle_session_limit: default_idle_session_limit(),
    }
}

fn default_recent_capacity() -> usize {
    cadence_playback::recent::DEFAULT_CAPACITY
}

fn default_idle_session_limit() -> usize {
    1024
}

fn default_reset() -> ResetSettings {
    ResetSettings {
        code_ttl_minutes: default_code_ttl_minutes(),
    }
}

fn default_code_ttl_minutes() -> i64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            uploads: default_uploads(),
            library: default_library(),
            playback: default_playback(),
            reset: default_reset(),
        }
    }
}
