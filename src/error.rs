//! Error types for the learning path engine

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for engine, storage and configuration operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Learning path not found: {0}")]
    PathNotFound(String),

    #[error("Learning path already exists: {0}")]
    DuplicatePath(String),

    #[error("Invalid learning path: {0}")]
    InvalidPath(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
