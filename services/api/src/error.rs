//! services/api/src/error.rs
//!
//! Defines the top-level error type for the `api` binaries. Handler-level
//! failures are mapped to `(StatusCode, String)` responses at the handler;
//! this type covers everything that can go wrong before the server is up.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting to Postgres or running migrations failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Binding or serving the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else that prevents startup.
    #[error("Internal error: {0}")]
    Internal(String),
}
