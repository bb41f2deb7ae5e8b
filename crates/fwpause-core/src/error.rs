//! Error taxonomy for fwpause operations
//!
//! Every variant is fatal for the current command. Non-fatal conditions
//! (deallocation poll timeout, single route failures) are reported through
//! outcome types instead.

use crate::settings::FIREWALL_SUBNET;
use fwpause_cloud::CloudError;
use std::path::PathBuf;
use thiserror::Error;

/// Bad or missing input, detected before any API call
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required parameter: {flag}")]
    MissingParameter { flag: &'static str },

    #[error("--storage-mode azure requires --storage-account")]
    MissingStorageAccount,

    #[error("UDR CSV file not found: {}", .0.display())]
    CsvNotFound(PathBuf),
}

/// Failure reading the firewall resource
#[derive(Error, Debug)]
pub enum ReadError {
    #[error(
        "Firewall '{firewall_name}' or resource group '{resource_group}' not found: {message}"
    )]
    NotFound {
        resource_group: String,
        firewall_name: String,
        message: String,
    },

    #[error("Permission denied reading firewall '{firewall_name}': {message}")]
    PermissionDenied {
        resource_group: String,
        firewall_name: String,
        message: String,
    },

    #[error("Could not parse firewall state: {0}")]
    Parse(String),

    #[error("Firewall read failed: {0}")]
    Unavailable(#[source] CloudError),
}

/// Config store failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No saved configuration found at {location}")]
    NotFound { location: String },

    #[error("IO error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Saved configuration at {location} is not valid JSON: {source}")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Blob storage error: {0}")]
    Backend(#[from] CloudError),
}

/// Allocation or deallocation failure
#[derive(Error, Debug)]
pub enum OpError {
    #[error("Failed to remove IP configuration '{name}': {source}")]
    RemoveFailed {
        name: String,
        /// Configurations removed before the failure
        removed: Vec<String>,
        #[source]
        source: CloudError,
    },

    #[error("Failed to create IP configuration '{name}': {source}")]
    CreateFailed {
        name: String,
        vnet_name: String,
        vnet_resource_group: String,
        public_ip_name: String,
        #[source]
        source: CloudError,
    },

    #[error("Saved configuration '{name}' has no public IP reference")]
    MissingPublicIp { name: String },

    #[error("Saved configuration contains no IP configurations")]
    EmptySnapshot,

    #[error("No private IP appeared within {waited_secs}s after allocation")]
    AllocationTimeout { waited_secs: u64 },

    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Route reconciliation could not start
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Cannot read UDR CSV {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Remediation hint shown to the operator
    pub fn hint(&self) -> Option<String> {
        match self {
            Error::Validation(_) => Some("Run 'fwpause --help' for usage".to_string()),
            Error::Read(e) => Some(e.hint()),
            Error::Store(e) => e.hint(),
            Error::Op(e) => e.hint(),
            Error::Route(_) => Some("Check the --udr-csv path and file permissions".to_string()),
        }
    }
}

impl ReadError {
    pub fn hint(&self) -> String {
        match self {
            ReadError::NotFound {
                resource_group,
                firewall_name,
                ..
            } => format!(
                "Check that resource group '{}' exists (az group show -n {}) and that firewall name '{}' is correct",
                resource_group, resource_group, firewall_name
            ),
            ReadError::PermissionDenied { resource_group, .. } => format!(
                "Check that the signed-in identity has Reader (status) or Network Contributor (pause/resume) on resource group '{}'",
                resource_group
            ),
            ReadError::Parse(_) => {
                "Run with --verbose to see the az command; update the Azure CLI if its output format changed"
                    .to_string()
            }
            ReadError::Unavailable(CloudError::CliNotFound(_)) => {
                "Install the Azure CLI and run 'az login'".to_string()
            }
            ReadError::Unavailable(_) => {
                "Check 'az login' and network connectivity, then retry".to_string()
            }
        }
    }
}

impl StoreError {
    pub fn hint(&self) -> Option<String> {
        match self {
            StoreError::NotFound { .. } => {
                Some("Run 'fwpause pause' first to save the firewall configuration".to_string())
            }
            StoreError::Backend(_) => Some(
                "Check --storage-account/--storage-container and that the identity has Storage Blob Data Contributor"
                    .to_string(),
            ),
            StoreError::Json { .. } => Some(
                "The saved configuration is damaged; restore it from a backup or re-create the IP configuration manually"
                    .to_string(),
            ),
            StoreError::Io { .. } => None,
        }
    }
}

impl OpError {
    pub fn hint(&self) -> Option<String> {
        match self {
            OpError::RemoveFailed { removed, .. } if removed.is_empty() => Some(
                "Check permissions and that no other operation is running on the firewall".to_string(),
            ),
            OpError::RemoveFailed { removed, .. } => Some(format!(
                "The firewall is partially deallocated (already removed: {}). Do not re-run pause, it would overwrite the saved configuration; remove the remaining IP configurations manually",
                removed.join(", ")
            )),
            OpError::CreateFailed {
                vnet_name,
                vnet_resource_group,
                public_ip_name,
                ..
            } => Some(format!(
                "Check that vnet '{}' exists in resource group '{}' and contains subnet '{}', that public IP '{}' exists and is not attached elsewhere, and that the identity has Network Contributor",
                vnet_name, vnet_resource_group, FIREWALL_SUBNET, public_ip_name
            )),
            OpError::MissingPublicIp { .. } | OpError::EmptySnapshot => Some(
                "The saved configuration is incomplete; attach the public IP manually in the portal"
                    .to_string(),
            ),
            OpError::AllocationTimeout { .. } => Some(
                "Check the firewall's provisioning state with 'fwpause status'; routes were not updated"
                    .to_string(),
            ),
            OpError::Read(e) => Some(e.hint()),
        }
    }
}

impl From<CloudError> for ReadError {
    fn from(error: CloudError) -> Self {
        match error {
            CloudError::Parse(message) => ReadError::Parse(message),
            CloudError::Json(e) => ReadError::Parse(e.to_string()),
            other => ReadError::Unavailable(other),
        }
    }
}

impl ReadError {
    /// Attach the firewall being read to a cloud error
    pub fn from_cloud(error: CloudError, resource_group: &str, firewall_name: &str) -> Self {
        match error {
            CloudError::NotFound(message) => ReadError::NotFound {
                resource_group: resource_group.to_string(),
                firewall_name: firewall_name.to_string(),
                message,
            },
            CloudError::PermissionDenied(message) => ReadError::PermissionDenied {
                resource_group: resource_group.to_string(),
                firewall_name: firewall_name.to_string(),
                message,
            },
            other => other.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_from_cloud() {
        let error = ReadError::from_cloud(CloudError::NotFound("gone".to_string()), "rg1", "fw1");
        assert!(matches!(error, ReadError::NotFound { .. }));
        assert!(error.hint().contains("rg1"));

        let error = ReadError::from_cloud(
            CloudError::PermissionDenied("AuthorizationFailed".to_string()),
            "rg1",
            "fw1",
        );
        assert!(matches!(error, ReadError::PermissionDenied { .. }));

        let error = ReadError::from_cloud(CloudError::Parse("bad".to_string()), "rg1", "fw1");
        assert!(matches!(error, ReadError::Parse(_)));
    }

    #[test]
    fn test_partial_removal_hint_lists_removed() {
        let error = Error::Op(OpError::RemoveFailed {
            name: "ipcfg2".to_string(),
            removed: vec!["ipcfg1".to_string()],
            source: CloudError::CommandFailed("boom".to_string()),
        });
        let hint = error.hint().unwrap();
        assert!(hint.contains("ipcfg1"));
        assert!(hint.contains("Do not re-run pause"));
    }

    #[test]
    fn test_store_not_found_hint() {
        let error = Error::Store(StoreError::NotFound {
            location: "firewall-config.json".to_string(),
        });
        assert!(error.hint().unwrap().contains("fwpause pause"));
    }
}
