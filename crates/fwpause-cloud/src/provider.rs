//! Cloud management API traits

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Firewall management operations
///
/// The four calls fwpause needs from the management plane. Authentication,
/// transport retries and rate limiting belong to the implementation.
#[async_trait]
pub trait FirewallApi: Send + Sync {
    /// Returns the binding name (e.g., "azure-cli")
    fn name(&self) -> &str;

    /// Check if the binding is installed and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Read the firewall resource document by name
    async fn show_firewall(&self, resource_group: &str, firewall_name: &str)
    -> Result<serde_json::Value>;

    /// Remove one IP configuration from the firewall
    async fn delete_ip_configuration(
        &self,
        resource_group: &str,
        firewall_name: &str,
        name: &str,
    ) -> Result<()>;

    /// Create an IP configuration bound to a vnet and a public IP
    async fn create_ip_configuration(&self, request: &CreateIpConfigRequest) -> Result<()>;

    /// Point a route's next hop at the given address
    async fn set_route_next_hop(
        &self,
        resource_group: &str,
        route_table: &str,
        route: &str,
        next_hop_ip: &str,
    ) -> Result<()>;
}

/// Blob storage operations used by the remote config store
///
/// The storage account is fixed when the client is built; callers only name
/// containers and blobs.
#[async_trait]
pub trait BlobApi: Send + Sync {
    /// Storage account the client talks to
    fn account(&self) -> &str;

    async fn container_exists(&self, container: &str) -> Result<bool>;

    async fn create_container(&self, container: &str) -> Result<()>;

    /// Download a blob as text. `Ok(None)` when the blob does not exist.
    async fn get_blob(&self, container: &str, blob: &str) -> Result<Option<String>>;

    /// Upload a blob, overwriting any existing one
    async fn put_blob(&self, container: &str, blob: &str, content: &str) -> Result<()>;
}

/// Parameters for creating a firewall IP configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIpConfigRequest {
    pub resource_group: String,
    pub firewall_name: String,

    /// Name of the configuration slot to (re)create
    pub name: String,

    pub vnet_name: String,

    /// Resource group of the vnet; may differ from the firewall's
    pub vnet_resource_group: String,

    /// Short name of the public IP resource
    pub public_ip_name: String,
}

impl CreateIpConfigRequest {
    /// Whether the vnet lives outside the firewall's resource group
    pub fn vnet_is_external(&self) -> bool {
        self.vnet_resource_group != self.resource_group
    }
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnet_is_external() {
        let mut request = CreateIpConfigRequest {
            resource_group: "rg1".to_string(),
            firewall_name: "fw1".to_string(),
            name: "ipcfg1".to_string(),
            vnet_name: "hub".to_string(),
            vnet_resource_group: "rg1".to_string(),
            public_ip_name: "pip1".to_string(),
        };
        assert!(!request.vnet_is_external());

        request.vnet_resource_group = "network-rg".to_string();
        assert!(request.vnet_is_external());
    }

    #[test]
    fn test_auth_status() {
        let ok = AuthStatus::ok("contoso (0000)");
        assert!(ok.authenticated);
        assert!(ok.error.is_none());

        let failed = AuthStatus::failed("not logged in");
        assert!(!failed.authenticated);
        assert_eq!(failed.error.as_deref(), Some("not logged in"));
    }
}
