//! az CLI wrapper
//!
//! Wraps the Azure CLI commands fwpause needs. Authentication is whatever
//! identity `az` is logged in with; no secret ever passes through here.

use crate::error::{AzureError, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

/// az CLI wrapper
pub struct AzCli {
    program: String,
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new()
    }
}

impl AzCli {
    pub fn new() -> Self {
        Self::with_program("az")
    }

    /// Use a different executable (e.g., a wrapper script)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run an az command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.arg("--only-show-errors");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, args.join(" "));

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AzureError::AzNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureError::CommandFailed {
                command: command_label(args),
                stderr: stderr.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run an az command and parse the JSON object it prints
    async fn run_json<T: serde::de::DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let output = self.run_command(args).await?;
        parse_json_output(&output).ok_or_else(|| AzureError::NoJson {
            command: command_label(args),
        })?
    }

    /// Show the signed-in account
    pub async fn account_show(&self) -> Result<AccountInfo> {
        self.run_json(&["account", "show", "--output", "json"]).await
    }

    /// Show a firewall resource
    pub async fn firewall_show(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<serde_json::Value> {
        self.run_json(&[
            "network",
            "firewall",
            "show",
            "--resource-group",
            resource_group,
            "--name",
            name,
            "--output",
            "json",
        ])
        .await
    }

    /// Delete a firewall IP configuration
    pub async fn firewall_ip_config_delete(
        &self,
        resource_group: &str,
        firewall_name: &str,
        name: &str,
    ) -> Result<()> {
        self.run_command(&[
            "network",
            "firewall",
            "ip-config",
            "delete",
            "--resource-group",
            resource_group,
            "--firewall-name",
            firewall_name,
            "--name",
            name,
        ])
        .await?;
        Ok(())
    }

    /// Create a firewall IP configuration
    ///
    /// `vnet` is a vnet name in the firewall's resource group or a full
    /// vnet resource ID. The subnet is always `AzureFirewallSubnet`.
    pub async fn firewall_ip_config_create(
        &self,
        resource_group: &str,
        firewall_name: &str,
        name: &str,
        vnet: &str,
        public_ip: &str,
    ) -> Result<()> {
        self.run_command(&[
            "network",
            "firewall",
            "ip-config",
            "create",
            "--resource-group",
            resource_group,
            "--firewall-name",
            firewall_name,
            "--name",
            name,
            "--vnet-name",
            vnet,
            "--public-ip-address",
            public_ip,
            "--output",
            "json",
        ])
        .await?;
        Ok(())
    }

    /// Update a route's next-hop address
    pub async fn route_update(
        &self,
        resource_group: &str,
        route_table: &str,
        route: &str,
        next_hop_ip: &str,
    ) -> Result<()> {
        self.run_command(&[
            "network",
            "route-table",
            "route",
            "update",
            "--resource-group",
            resource_group,
            "--route-table-name",
            route_table,
            "--name",
            route,
            "--next-hop-ip-address",
            next_hop_ip,
            "--output",
            "json",
        ])
        .await?;
        Ok(())
    }

    // ========== Storage Operations ==========

    pub async fn storage_container_exists(&self, account: &str, container: &str) -> Result<bool> {
        let result: ExistsResult = self
            .run_json(&[
                "storage",
                "container",
                "exists",
                "--account-name",
                account,
                "--name",
                container,
                "--auth-mode",
                "login",
                "--output",
                "json",
            ])
            .await?;
        Ok(result.exists)
    }

    pub async fn storage_container_create(&self, account: &str, container: &str) -> Result<()> {
        self.run_command(&[
            "storage",
            "container",
            "create",
            "--account-name",
            account,
            "--name",
            container,
            "--auth-mode",
            "login",
            "--output",
            "json",
        ])
        .await?;
        Ok(())
    }

    pub async fn storage_blob_exists(
        &self,
        account: &str,
        container: &str,
        blob: &str,
    ) -> Result<bool> {
        let result: ExistsResult = self
            .run_json(&[
                "storage",
                "blob",
                "exists",
                "--account-name",
                account,
                "--container-name",
                container,
                "--name",
                blob,
                "--auth-mode",
                "login",
                "--output",
                "json",
            ])
            .await?;
        Ok(result.exists)
    }

    /// Download a blob and return its content
    pub async fn storage_blob_download(
        &self,
        account: &str,
        container: &str,
        blob: &str,
    ) -> Result<String> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("download.json");
        let file = path.to_string_lossy().to_string();

        self.run_command(&[
            "storage",
            "blob",
            "download",
            "--account-name",
            account,
            "--container-name",
            container,
            "--name",
            blob,
            "--file",
            &file,
            "--auth-mode",
            "login",
            "--no-progress",
            "--output",
            "none",
        ])
        .await?;

        Ok(tokio::fs::read_to_string(&path).await?)
    }

    /// Upload content to a blob, overwriting it
    pub async fn storage_blob_upload(
        &self,
        account: &str,
        container: &str,
        blob: &str,
        content: &str,
    ) -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("upload.json");
        tokio::fs::write(&path, content).await?;
        let file = path.to_string_lossy().to_string();

        self.run_command(&[
            "storage",
            "blob",
            "upload",
            "--account-name",
            account,
            "--container-name",
            container,
            "--name",
            blob,
            "--file",
            &file,
            "--overwrite",
            "--auth-mode",
            "login",
            "--no-progress",
            "--output",
            "none",
        ])
        .await?;
        Ok(())
    }
}

/// Subcommand words before the first flag, for error messages
fn command_label(args: &[&str]) -> String {
    args.iter()
        .take_while(|a| !a.starts_with("--"))
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locate the JSON object in az output
///
/// az sometimes prints warnings or diagnostics before the payload on stdout
/// (extension notices, deprecation messages). Everything before the first
/// `{` is discarded.
pub fn extract_json_object(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    Some(output[start..].trim_end())
}

/// Extract and parse the JSON object in az output
///
/// `None` when the output holds no object at all; `Some(Err)` when the
/// object is malformed.
pub fn parse_json_output<T: serde::de::DeserializeOwned>(output: &str) -> Option<Result<T>> {
    let json = extract_json_object(output)?;
    Some(serde_json::from_str(json).map_err(AzureError::from))
}

/// Signed-in account from `az account show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Subscription ID
    pub id: String,

    /// Subscription name
    pub name: String,

    #[serde(rename = "tenantId", default)]
    pub tenant_id: Option<String>,

    #[serde(default)]
    pub user: Option<AccountUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUser {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_skips_leading_noise() {
        let output = "WARNING: The command requires the extension azure-firewall. It will be installed first.\n{\n  \"name\": \"fw1\"\n}\n";
        assert_eq!(extract_json_object(output), Some("{\n  \"name\": \"fw1\"\n}"));
    }

    #[test]
    fn test_extract_json_without_object() {
        assert_eq!(extract_json_object("WARNING: nothing here\n"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_parse_json_output() {
        let value: serde_json::Value =
            parse_json_output("noise {\"ipConfigurations\": []}").unwrap().unwrap();
        assert_eq!(value["ipConfigurations"], serde_json::json!([]));

        let malformed = parse_json_output::<serde_json::Value>("WARNING {\"name\": ");
        assert!(matches!(malformed, Some(Err(AzureError::JsonError(_)))));
    }

    #[test]
    fn test_account_info() {
        let info: AccountInfo = parse_json_output(
            r#"{"id": "1111", "name": "prod", "tenantId": "2222", "user": {"name": "ops@contoso.com", "type": "user"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(info.id, "1111");
        assert_eq!(info.user.unwrap().name, "ops@contoso.com");
    }

    #[test]
    fn test_command_label() {
        assert_eq!(
            command_label(&["network", "firewall", "show", "--name", "fw1"]),
            "network firewall show"
        );
    }

    #[tokio::test]
    async fn test_missing_program() {
        let az = AzCli::with_program("fwpause-test-no-such-az");
        let result = az.account_show().await;
        assert!(matches!(result, Err(AzureError::AzNotFound)));
    }
}
