//! Firewall status reader

use crate::error::ReadError;
use crate::fields::{self, resource_name};
use crate::settings::FirewallTarget;
use crate::snapshot::IpConfigurationSnapshot;
use fwpause_cloud::FirewallApi;
use serde_json::Value;
use std::fmt;

/// State derived from the IP configuration count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallState {
    Paused,
    Running,
}

impl fmt::Display for FirewallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirewallState::Paused => write!(f, "PAUSED"),
            FirewallState::Running => write!(f, "RUNNING"),
        }
    }
}

/// One fresh read of the firewall resource
#[derive(Debug, Clone, PartialEq)]
pub struct FirewallObservation {
    pub ip_configuration_count: usize,
    pub provisioning_state: Option<String>,
    pub ip_configurations: Vec<Value>,
    pub management_ip_configuration: Option<Value>,
}

impl FirewallObservation {
    pub fn from_resource(resource: &Value) -> Result<Self, ReadError> {
        if !resource.is_object() {
            return Err(ReadError::Parse(format!(
                "expected a JSON object, got {}",
                json_kind(resource)
            )));
        }

        let ip_configurations = match fields::IP_CONFIGURATIONS.lookup(resource) {
            None => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(ReadError::Parse(format!(
                    "{} is {}, expected an array",
                    fields::IP_CONFIGURATIONS.field,
                    json_kind(other)
                )));
            }
        };

        // every entry must be addressable by name for deallocate to remove it
        if let Some(index) = ip_configurations
            .iter()
            .position(|c| fields::NAME.string(c).is_none())
        {
            return Err(ReadError::Parse(format!(
                "{} entry {} has no name",
                fields::IP_CONFIGURATIONS.field,
                index
            )));
        }

        Ok(Self {
            ip_configuration_count: ip_configurations.len(),
            provisioning_state: fields::PROVISIONING_STATE
                .string(resource)
                .map(str::to_string),
            ip_configurations,
            management_ip_configuration: fields::MANAGEMENT_IP_CONFIGURATION
                .lookup(resource)
                .cloned(),
        })
    }

    pub fn state(&self) -> FirewallState {
        if self.ip_configuration_count == 0 {
            FirewallState::Paused
        } else {
            FirewallState::Running
        }
    }

    pub fn configuration_names(&self) -> Vec<String> {
        self.ip_configurations
            .iter()
            .filter_map(|c| fields::NAME.string(c))
            .map(str::to_string)
            .collect()
    }

    /// Private IP of the first configuration, if one is assigned yet
    pub fn first_private_ip(&self) -> Option<&str> {
        self.ip_configurations
            .first()
            .and_then(|c| fields::PRIVATE_IP.string(c))
    }

    pub fn entries(&self) -> Vec<IpConfigurationSnapshot> {
        self.ip_configurations
            .iter()
            .map(|c| IpConfigurationSnapshot::from_value(c, None))
            .collect()
    }

    pub fn has_management_configuration(&self) -> bool {
        self.management_ip_configuration.is_some()
    }

    pub fn management_public_ip_name(&self) -> Option<&str> {
        self.management_ip_configuration
            .as_ref()
            .and_then(|c| fields::PUBLIC_IP_REFERENCE.string(c))
            .and_then(resource_name)
    }
}

/// Read the firewall and derive an observation
pub async fn fetch(
    api: &dyn FirewallApi,
    target: &FirewallTarget,
) -> Result<FirewallObservation, ReadError> {
    tracing::debug!(
        "Reading firewall {}/{}",
        target.resource_group,
        target.name
    );
    let resource = api
        .show_firewall(&target.resource_group, &target.name)
        .await
        .map_err(|e| ReadError::from_cloud(e, &target.resource_group, &target.name))?;

    FirewallObservation::from_resource(&resource)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwpause_cloud::CloudError;
    use fwpause_cloud::testing::{FakeFirewall, firewall_document};
    use serde_json::json;

    fn target() -> FirewallTarget {
        FirewallTarget {
            resource_group: "rg1".to_string(),
            name: "fw1".to_string(),
        }
    }

    #[test]
    fn test_running_observation() {
        let doc = firewall_document(&[
            ("ipcfg1", Some("10.1.2.4"), "/x/publicIPAddresses/pip1"),
            ("ipcfg2", None, "/x/publicIPAddresses/pip2"),
        ]);
        let observation = FirewallObservation::from_resource(&doc).unwrap();
        assert_eq!(observation.state(), FirewallState::Running);
        assert_eq!(observation.ip_configuration_count, 2);
        assert_eq!(observation.provisioning_state.as_deref(), Some("Succeeded"));
        assert_eq!(observation.configuration_names(), vec!["ipcfg1", "ipcfg2"]);
        assert_eq!(observation.first_private_ip(), Some("10.1.2.4"));
        assert!(!observation.has_management_configuration());
    }

    #[test]
    fn test_paused_when_field_missing_or_empty() {
        for doc in [
            json!({ "name": "fw1", "provisioningState": "Succeeded" }),
            json!({ "name": "fw1", "ipConfigurations": [] }),
            json!({ "name": "fw1", "ipConfigurations": null }),
        ] {
            let observation = FirewallObservation::from_resource(&doc).unwrap();
            assert_eq!(observation.state(), FirewallState::Paused, "{}", doc);
        }
    }

    #[test]
    fn test_rest_shape() {
        let doc = json!({
            "properties": {
                "provisioningState": "Updating",
                "ipConfigurations": [{ "name": "a", "properties": { "privateIPAddress": "10.0.0.4" } }],
                "managementIpConfiguration": {
                    "name": "mgmt",
                    "properties": { "publicIPAddress": { "id": "/x/publicIPAddresses/mgmt-pip" } }
                }
            }
        });
        let observation = FirewallObservation::from_resource(&doc).unwrap();
        assert_eq!(observation.provisioning_state.as_deref(), Some("Updating"));
        assert_eq!(observation.first_private_ip(), Some("10.0.0.4"));
        assert_eq!(observation.management_public_ip_name(), Some("mgmt-pip"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            FirewallObservation::from_resource(&json!([1, 2])),
            Err(ReadError::Parse(_))
        ));
        assert!(matches!(
            FirewallObservation::from_resource(&json!({ "ipConfigurations": "oops" })),
            Err(ReadError::Parse(_))
        ));
    }

    #[test]
    fn test_unnamed_configuration_is_parse_error() {
        let doc = json!({
            "ipConfigurations": [
                { "name": "ipcfg1", "privateIpAddress": "10.1.2.4" },
                { "privateIpAddress": "10.1.2.5" }
            ]
        });
        match FirewallObservation::from_resource(&doc) {
            Err(ReadError::Parse(message)) => assert!(message.contains("entry 1"), "{}", message),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_maps_not_found() {
        let api = FakeFirewall::new(firewall_document(&[]))
            .fail_show(CloudError::NotFound("ResourceGroupNotFound".to_string()));
        let error = fetch(&api, &target()).await.unwrap_err();
        match error {
            ReadError::NotFound {
                resource_group,
                firewall_name,
                ..
            } => {
                assert_eq!(resource_group, "rg1");
                assert_eq!(firewall_name, "fw1");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_is_read_only() {
        let api = FakeFirewall::new(firewall_document(&[("ipcfg1", Some("10.1.2.4"), "/x/pip1")]));
        let first = fetch(&api, &target()).await.unwrap();
        let second = fetch(&api, &target()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(api.show_count(), 2);
        assert!(api.mutating_calls().is_empty());
    }
}
