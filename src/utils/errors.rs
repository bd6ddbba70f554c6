use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraextorError {
    #[error("ACME file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("JSON error in store '{store}': {source}")]
    ParseStore {
        store: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid ACME store: {0}")]
    InvalidStore(String),

    #[error("Invalid base64 in {field} of certificate '{domain}': {source}")]
    Decode {
        domain: String,
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TraextorError>;
