//! Azure implementation of the fwpause cloud contract

use crate::az::AzCli;
use crate::error::AzureError;
use async_trait::async_trait;
use fwpause_cloud::{AuthStatus, BlobApi, CreateIpConfigRequest, FirewallApi};

/// Azure firewall management through the az CLI
pub struct AzureProvider {
    az: AzCli,
}

impl Default for AzureProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureProvider {
    pub fn new() -> Self {
        Self { az: AzCli::new() }
    }

    pub fn with_cli(az: AzCli) -> Self {
        Self { az }
    }

    /// Resolve the `--vnet-name` argument for a create request
    ///
    /// az only resolves bare vnet names inside the firewall's resource group,
    /// so a vnet elsewhere is passed as a full resource ID.
    async fn vnet_argument(&self, request: &CreateIpConfigRequest) -> fwpause_cloud::Result<String> {
        if !request.vnet_is_external() {
            return Ok(request.vnet_name.clone());
        }
        let account = self.az.account_show().await?;
        Ok(vnet_resource_id(
            &account.id,
            &request.vnet_resource_group,
            &request.vnet_name,
        ))
    }
}

/// Build a vnet resource ID
pub fn vnet_resource_id(subscription_id: &str, resource_group: &str, vnet_name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/virtualNetworks/{}",
        subscription_id, resource_group, vnet_name
    )
}

#[async_trait]
impl FirewallApi for AzureProvider {
    fn name(&self) -> &str {
        "azure-cli"
    }

    async fn check_auth(&self) -> fwpause_cloud::Result<AuthStatus> {
        match self.az.account_show().await {
            Ok(account) => {
                let user = account
                    .user
                    .map(|u| u.name)
                    .unwrap_or_else(|| "unknown user".to_string());
                Ok(AuthStatus::ok(format!("{} / {} ({})", user, account.name, account.id)))
            }
            Err(AzureError::AzNotFound) => Ok(AuthStatus::failed(
                "az is not installed. Install the Azure CLI first",
            )),
            Err(AzureError::CommandFailed { stderr, .. }) => Ok(AuthStatus::failed(format!(
                "az is not logged in. Run 'az login' ({})",
                stderr.trim()
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    async fn show_firewall(
        &self,
        resource_group: &str,
        firewall_name: &str,
    ) -> fwpause_cloud::Result<serde_json::Value> {
        Ok(self.az.firewall_show(resource_group, firewall_name).await?)
    }

    async fn delete_ip_configuration(
        &self,
        resource_group: &str,
        firewall_name: &str,
        name: &str,
    ) -> fwpause_cloud::Result<()> {
        Ok(self
            .az
            .firewall_ip_config_delete(resource_group, firewall_name, name)
            .await?)
    }

    async fn create_ip_configuration(
        &self,
        request: &CreateIpConfigRequest,
    ) -> fwpause_cloud::Result<()> {
        let vnet = self.vnet_argument(request).await?;
        Ok(self
            .az
            .firewall_ip_config_create(
                &request.resource_group,
                &request.firewall_name,
                &request.name,
                &vnet,
                &request.public_ip_name,
            )
            .await?)
    }

    async fn set_route_next_hop(
        &self,
        resource_group: &str,
        route_table: &str,
        route: &str,
        next_hop_ip: &str,
    ) -> fwpause_cloud::Result<()> {
        Ok(self
            .az
            .route_update(resource_group, route_table, route, next_hop_ip)
            .await?)
    }
}

/// Azure Blob Storage through the az CLI (`--auth-mode login`)
pub struct AzureBlobClient {
    az: AzCli,
    account: String,
}

impl AzureBlobClient {
    pub fn new(account: impl Into<String>) -> Self {
        Self::with_cli(AzCli::new(), account)
    }

    pub fn with_cli(az: AzCli, account: impl Into<String>) -> Self {
        Self {
            az,
            account: account.into(),
        }
    }
}

#[async_trait]
impl BlobApi for AzureBlobClient {
    fn account(&self) -> &str {
        &self.account
    }

    async fn container_exists(&self, container: &str) -> fwpause_cloud::Result<bool> {
        Ok(self
            .az
            .storage_container_exists(&self.account, container)
            .await?)
    }

    async fn create_container(&self, container: &str) -> fwpause_cloud::Result<()> {
        Ok(self
            .az
            .storage_container_create(&self.account, container)
            .await?)
    }

    async fn get_blob(&self, container: &str, blob: &str) -> fwpause_cloud::Result<Option<String>> {
        if !self
            .az
            .storage_blob_exists(&self.account, container, blob)
            .await?
        {
            return Ok(None);
        }
        let content = self
            .az
            .storage_blob_download(&self.account, container, blob)
            .await?;
        Ok(Some(content))
    }

    async fn put_blob(
        &self,
        container: &str,
        blob: &str,
        content: &str,
    ) -> fwpause_cloud::Result<()> {
        Ok(self
            .az
            .storage_blob_upload(&self.account, container, blob, content)
            .await?)
    }
}
