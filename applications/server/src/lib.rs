//! Cadence Server Library
//!
//! HTTP adapter for the Cadence music service: catalog and playlist routes,
//! liked songs, accounts, password reset and per-client playback sessions.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use api::create_router;
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{AccountService, FileStorage, LogMailer, Mailer, MemoryMailer, SessionHost};
pub use state::AppState;
