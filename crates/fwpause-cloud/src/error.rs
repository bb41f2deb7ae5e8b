//! Cloud management API error types

use thiserror::Error;

/// Errors reported by a cloud management API binding
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unparseable API response: {0}")]
    Parse(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Management CLI not found: {0}")]
    CliNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
