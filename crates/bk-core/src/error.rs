//! Error types for bk-core

use thiserror::Error;

/// Main error type for bk-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for bk-core
pub type Result<T> = std::result::Result<T, Error>;
