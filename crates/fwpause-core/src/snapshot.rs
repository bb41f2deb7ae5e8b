//! Saved IP configuration snapshot
//!
//! Written by `pause`, read by `resume`. The raw IP configuration entries
//! are stored as observed, and typed views are extracted through the field
//! alias tables, so snapshots from older writers keep loading.

use crate::fields::{self, resource_name};
use crate::settings::FirewallTarget;
use crate::status::FirewallObservation;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

/// Persisted snapshot document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default, alias = "ip_configurations", alias = "IpConfigurations")]
    pub ip_configurations: Vec<Value>,

    #[serde(default, alias = "management_ip_configuration")]
    pub management_ip_configuration: Option<Value>,

    #[serde(default, alias = "firewall_name")]
    pub firewall_name: String,

    #[serde(default, alias = "resource_group")]
    pub resource_group: String,

    /// Informational only; unreadable timestamps load as `None`
    #[serde(default, alias = "saved_at", deserialize_with = "lenient_timestamp")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// RFC 3339 first, then an offset-less date-time taken as UTC
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

impl ConfigSnapshot {
    /// Capture the live configuration of a running firewall
    ///
    /// Returns `None` when the firewall has no IP configurations: an empty
    /// snapshot is never a valid resume source.
    pub fn capture(target: &FirewallTarget, observation: &FirewallObservation) -> Option<Self> {
        if observation.ip_configurations.is_empty() {
            return None;
        }
        Some(Self {
            ip_configurations: observation.ip_configurations.clone(),
            management_ip_configuration: observation.management_ip_configuration.clone(),
            firewall_name: target.name.clone(),
            resource_group: target.resource_group.clone(),
            saved_at: Some(Utc::now()),
        })
    }

    /// Stand-in returned by dry-run loads
    pub fn placeholder(target: &FirewallTarget) -> Self {
        Self {
            ip_configurations: vec![json!({
                "name": "<saved-ip-configuration>",
                "publicIPAddress": { "id": "<saved-public-ip-reference>/<saved-public-ip>" },
            })],
            management_ip_configuration: None,
            firewall_name: target.name.clone(),
            resource_group: target.resource_group.clone(),
            saved_at: None,
        }
    }

    /// Typed views of every saved entry, in saved order
    pub fn entries(&self) -> Vec<IpConfigurationSnapshot> {
        self.ip_configurations
            .iter()
            .map(|raw| IpConfigurationSnapshot::from_value(raw, self.saved_at))
            .collect()
    }

    /// The entry resume restores
    pub fn primary(&self) -> Option<IpConfigurationSnapshot> {
        self.ip_configurations
            .first()
            .map(|raw| IpConfigurationSnapshot::from_value(raw, self.saved_at))
    }

    pub fn has_management_configuration(&self) -> bool {
        self.management_ip_configuration
            .as_ref()
            .is_some_and(|v| !v.is_null())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

/// One IP configuration as saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpConfigurationSnapshot {
    pub name: String,
    pub private_address: Option<String>,
    pub public_address_reference: Option<String>,
    pub subnet_reference: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl IpConfigurationSnapshot {
    pub fn from_value(raw: &Value, saved_at: Option<DateTime<Utc>>) -> Self {
        Self {
            name: fields::NAME.string(raw).unwrap_or_default().to_string(),
            private_address: fields::PRIVATE_IP.string(raw).map(str::to_string),
            public_address_reference: fields::PUBLIC_IP_REFERENCE.string(raw).map(str::to_string),
            subnet_reference: fields::SUBNET_REFERENCE.string(raw).map(str::to_string),
            saved_at,
        }
    }

    /// Short public IP resource name (trailing segment of the reference)
    pub fn public_ip_name(&self) -> Option<&str> {
        self.public_address_reference
            .as_deref()
            .and_then(resource_name)
    }
}
