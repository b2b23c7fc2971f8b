/// Core error types for Cadence
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Cadence
///
/// The first four variants form the user-facing taxonomy. Every mutation that
/// fails with one of them leaves the prior state untouched.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Track, playlist or user id does not resolve
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Caller lacks ownership or admin privilege
    #[error("{0}")]
    Unauthorized(String),

    /// Recoverable rejection (duplicate track, redundant like, ...)
    #[error("{0}")]
    InvalidState(String),

    /// A creation operation is missing a mandatory asset
    #[error("{0}")]
    AssetRequired(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an asset required error
    pub fn asset_required(msg: impl Into<String>) -> Self {
        Self::AssetRequired(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for the not-found variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = CoreError::not_found("Playlist", "p1");
        assert_eq!(err.to_string(), "Playlist not found: p1");
        assert!(err.is_not_found());
    }

    #[test]
    fn taxonomy_messages_are_user_facing() {
        assert_eq!(
            CoreError::invalid_state("Song already in playlist").to_string(),
            "Song already in playlist"
        );
        assert_eq!(
            CoreError::asset_required("Cover image is required").to_string(),
            "Cover image is required"
        );
    }
}
