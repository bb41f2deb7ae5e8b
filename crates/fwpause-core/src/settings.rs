//! Immutable run settings
//!
//! Built once at startup from CLI input and passed by reference to every
//! component. Nothing below this module reads the environment.

use crate::error::ValidationError;
use std::path::PathBuf;

/// Subnet Azure always binds firewall IP configurations to
pub const FIREWALL_SUBNET: &str = "AzureFirewallSubnet";

pub const DEFAULT_CONFIG_PATH: &str = "firewall-config.json";

pub const DEFAULT_CONTAINER: &str = "firewall-configs";

/// Where the IP configuration snapshot is kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageMode {
    #[default]
    Local,
    Azure,
}

/// Raw, unvalidated input
#[derive(Debug, Clone, Default)]
pub struct SettingsInput {
    pub resource_group: Option<String>,
    pub firewall_name: Option<String>,
    pub vnet_resource_group: Option<String>,
    pub vnet_name: Option<String>,
    pub subnet_name: Option<String>,
    pub config_path: Option<PathBuf>,
    pub udr_csv: Option<PathBuf>,
    pub storage_mode: StorageMode,
    pub storage_account: Option<String>,
    pub storage_container: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallTarget {
    pub resource_group: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VnetTarget {
    pub resource_group: String,
    pub name: String,
    pub subnet: String,
}

impl VnetTarget {
    pub fn uses_firewall_subnet(&self) -> bool {
        self.subnet == FIREWALL_SUBNET
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSettings {
    Local {
        path: PathBuf,
    },
    Blob {
        account: String,
        container: String,
        blob: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub firewall: FirewallTarget,
    pub vnet: VnetTarget,
    pub storage: StorageSettings,
    pub udr_csv: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
}

impl Settings {
    /// Validate input and apply defaults
    pub fn resolve(input: SettingsInput) -> Result<Self, ValidationError> {
        let resource_group = required(input.resource_group, "--rg")?;
        let firewall_name = required(input.firewall_name, "--fw")?;
        let vnet_name = required(input.vnet_name, "--vnet")?;

        let vnet_resource_group =
            non_empty(input.vnet_resource_group).unwrap_or_else(|| resource_group.clone());
        let subnet = non_empty(input.subnet_name).unwrap_or_else(|| FIREWALL_SUBNET.to_string());

        let firewall = FirewallTarget {
            resource_group,
            name: firewall_name,
        };

        let storage = match input.storage_mode {
            StorageMode::Local => StorageSettings::Local {
                path: input
                    .config_path
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            },
            StorageMode::Azure => StorageSettings::Blob {
                account: non_empty(input.storage_account)
                    .ok_or(ValidationError::MissingStorageAccount)?,
                container: non_empty(input.storage_container)
                    .unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
                blob: blob_name(&firewall),
            },
        };

        let udr_csv = input.udr_csv.filter(|p| !p.as_os_str().is_empty());
        if let Some(ref path) = udr_csv {
            if !path.is_file() {
                return Err(ValidationError::CsvNotFound(path.clone()));
            }
        }

        Ok(Self {
            firewall,
            vnet: VnetTarget {
                resource_group: vnet_resource_group,
                name: vnet_name,
                subnet,
            },
            storage,
            udr_csv,
            dry_run: input.dry_run,
            verbose: input.verbose,
        })
    }
}

/// Blob key for a firewall's snapshot: `{resourceGroup}/{firewallName}/config.json`
pub fn blob_name(firewall: &FirewallTarget) -> String {
    format!("{}/{}/config.json", firewall.resource_group, firewall.name)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, flag: &'static str) -> Result<String, ValidationError> {
    non_empty(value).ok_or(ValidationError::MissingParameter { flag })
}
