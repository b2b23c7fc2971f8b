//! Cadence Storage
//!
//! `SQLite` database layer for Cadence: track catalog, playlists, liked
//! songs, user accounts and per-client player state.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: Each feature owns its own queries (`tracks`,
//!   `playlists`, `library`, `users`, `sessions`)
//! - **Boundary Traits**: [`SqliteStore`] implements the `cadence-core`
//!   `CatalogStore`, `AccountStore` and `SnapshotStore` traits
//! - **Cascades**: track and user deletion clean up dependent rows in one
//!   transaction
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_storage::{SqliteStore, create_pool, run_migrations};
//! use cadence_core::storage::CatalogStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://cadence.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteStore::new(pool);
//! let tracks = store.list_tracks().await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod library;
pub mod playlists;
pub mod sessions;
pub mod tracks;
pub mod users;

pub use context::SqliteStore;
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before serving requests.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    tracing::debug!("database migrations applied");
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `sqlite://cadence.db`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::info!(url = %database_url, "opening database");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
