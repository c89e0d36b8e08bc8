//! Error types for deskbot-core

use thiserror::Error;

/// Main error type for deskbot-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for deskbot-core
pub type Result<T> = std::result::Result<T, Error>;
