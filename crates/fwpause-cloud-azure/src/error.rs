//! Azure binding error types

use fwpause_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("az not found. Please install the Azure CLI: https://aka.ms/azure-cli")]
    AzNotFound,

    #[error("az {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("az {command} printed no JSON object")]
    NoJson { command: String },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AzureError>;

/// How a failed `az` invocation should be reported upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    Other,
}

const NOT_FOUND_MARKERS: &[&str] = &[
    "ResourceNotFound",
    "ResourceGroupNotFound",
    "ParentResourceNotFound",
    "BlobNotFound",
    "ContainerNotFound",
    "was not found",
    "could not be found",
];

const PERMISSION_MARKERS: &[&str] = &[
    "AuthorizationFailed",
    "AuthorizationPermissionMismatch",
    "does not have authorization",
    "Forbidden",
];

/// Classify `az` stderr into the contract's error kinds
pub fn classify_failure(stderr: &str) -> FailureKind {
    if PERMISSION_MARKERS.iter().any(|m| stderr.contains(m)) {
        FailureKind::PermissionDenied
    } else if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        FailureKind::NotFound
    } else {
        FailureKind::Other
    }
}

impl From<AzureError> for CloudError {
    fn from(error: AzureError) -> Self {
        match error {
            AzureError::AzNotFound => CloudError::CliNotFound(error.to_string()),
            AzureError::CommandFailed { ref stderr, .. } => {
                let message = stderr.trim().to_string();
                match classify_failure(stderr) {
                    FailureKind::NotFound => CloudError::NotFound(message),
                    FailureKind::PermissionDenied => CloudError::PermissionDenied(message),
                    FailureKind::Other => CloudError::CommandFailed(error.to_string()),
                }
            }
            AzureError::NoJson { .. } | AzureError::JsonError(_) => {
                CloudError::Parse(error.to_string())
            }
            AzureError::IoError(e) => CloudError::Io(e),
        }
    }
}
