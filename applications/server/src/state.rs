/// Shared application state
use crate::{
    config::ServerConfig,
    error::Result,
    services::{AccountService, FileStorage, Mailer, SessionHost},
};
use cadence_core::Library;
use cadence_storage::SqliteStore;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub library: Library,
    pub accounts: Arc<AccountService>,
    pub file_storage: Arc<FileStorage>,
    pub sessions: Arc<SessionHost>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        library: Library,
        accounts: Arc<AccountService>,
        file_storage: Arc<FileStorage>,
        sessions: Arc<SessionHost>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            library,
            accounts,
            file_storage,
            sessions,
            config,
        }
    }

    /// Wire every service on top of one store
    ///
    /// Creates the upload directories if they are missing.
    pub async fn build(
        config: ServerConfig,
        store: SqliteStore,
        mailer: Arc<dyn Mailer>,
        bcrypt_cost: u32,
    ) -> Result<Self> {
        let store = Arc::new(store);

        let file_storage = FileStorage::new(
            config.storage.upload_dir.clone(),
            config.uploads.max_image_bytes,
            config.uploads.max_audio_bytes,
        );
        file_storage.initialize().await?;
        let file_storage = Arc::new(file_storage);

        let library = Library::new(Arc::clone(&store) as _, Arc::clone(&file_storage) as _);

        let accounts = AccountService::new(
            Arc::clone(&store) as _,
            mailer,
            config.reset.code_ttl_minutes,
        )
        .with_bcrypt_cost(bcrypt_cost);

        let sessions = SessionHost::new(
            library.clone(),
            store,
            config.playback.session_config(),
            config.playback.idle_session_limit,
        );

        Ok(Self::new(
            library,
            Arc::new(accounts),
            file_storage,
            Arc::new(sessions),
            Arc::new(config),
        ))
    }
}
