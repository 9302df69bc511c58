//! Error types for pod2nix

use thiserror::Error;

/// Result type for pod2nix operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// pod2nix error types
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to convert Docker Compose: {0}")]
    Parse(String),

    #[error("Failed to convert Docker Compose: No services found in Docker Compose file")]
    NoServices,

    #[error("Invalid routing rule: {0}")]
    InvalidRoute(String),

    #[error("Invalid backend: {0} (expected 'docker' or 'podman')")]
    InvalidBackend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
