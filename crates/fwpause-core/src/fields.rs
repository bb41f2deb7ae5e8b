//! Field alias tables
//!
//! The firewall document and saved snapshots have used several spellings
//! for the same field over time (CLI versions, REST vs CLI output, older
//! snapshot writers). Each logical field is an ordered list of dotted paths;
//! the first one that resolves wins. Adding a spelling is a one-line change.

use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    /// Human name used in log messages
    pub field: &'static str,
    pub paths: &'static [&'static str],
}

pub const NAME: FieldAliases = FieldAliases {
    field: "name",
    paths: &["name", "Name", "properties.name"],
};

pub const PRIVATE_IP: FieldAliases = FieldAliases {
    field: "private IP address",
    paths: &[
        "privateIPAddress",
        "privateIpAddress",
        "private_ip_address",
        "properties.privateIPAddress",
        "properties.privateIpAddress",
    ],
};

pub const PUBLIC_IP_REFERENCE: FieldAliases = FieldAliases {
    field: "public IP reference",
    paths: &[
        "publicIPAddress.id",
        "publicIpAddress.id",
        "public_ip_address.id",
        "properties.publicIPAddress.id",
        "publicIPAddress",
        "publicIpAddress",
        "public_ip_address",
    ],
};

pub const SUBNET_REFERENCE: FieldAliases = FieldAliases {
    field: "subnet reference",
    paths: &["subnet.id", "properties.subnet.id", "subnet"],
};

pub const IP_CONFIGURATIONS: FieldAliases = FieldAliases {
    field: "IP configurations",
    paths: &[
        "ipConfigurations",
        "properties.ipConfigurations",
        "ip_configurations",
    ],
};

pub const MANAGEMENT_IP_CONFIGURATION: FieldAliases = FieldAliases {
    field: "management IP configuration",
    paths: &[
        "managementIpConfiguration",
        "properties.managementIpConfiguration",
        "management_ip_configuration",
    ],
};

pub const PROVISIONING_STATE: FieldAliases = FieldAliases {
    field: "provisioning state",
    paths: &["provisioningState", "properties.provisioningState"],
};

impl FieldAliases {
    /// First non-null value among the aliases
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.paths
            .iter()
            .filter_map(|path| walk(value, path))
            .find(|v| !v.is_null())
    }

    /// First non-empty string among the aliases
    ///
    /// Aliases resolving to a non-string (e.g., an object where a bare ID
    /// was expected) are skipped.
    pub fn string<'a>(&self, value: &'a Value) -> Option<&'a str> {
        self.paths
            .iter()
            .filter_map(|path| walk(value, path))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

fn walk<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// Trailing segment of a slash-delimited resource ID
pub fn resource_name(reference: &str) -> Option<&str> {
    reference
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_private_ip_spellings() {
        for doc in [
            json!({ "privateIPAddress": "10.1.2.4" }),
            json!({ "privateIpAddress": "10.1.2.4" }),
            json!({ "private_ip_address": "10.1.2.4" }),
            json!({ "properties": { "privateIPAddress": "10.1.2.4" } }),
        ] {
            assert_eq!(PRIVATE_IP.string(&doc), Some("10.1.2.4"), "{}", doc);
        }
    }

    #[test]
    fn test_public_ip_spellings() {
        let id = "/subscriptions/1/resourceGroups/rg1/providers/Microsoft.Network/publicIPAddresses/pip1";
        for doc in [
            json!({ "publicIPAddress": { "id": id } }),
            json!({ "publicIpAddress": { "id": id } }),
            json!({ "public_ip_address": { "id": id } }),
            json!({ "properties": { "publicIPAddress": { "id": id } } }),
            json!({ "publicIPAddress": id }),
        ] {
            assert_eq!(PUBLIC_IP_REFERENCE.string(&doc), Some(id), "{}", doc);
        }
    }

    #[test]
    fn test_empty_and_null_values_skipped() {
        let doc = json!({ "privateIPAddress": "", "privateIpAddress": null, "properties": { "privateIPAddress": "10.0.0.4" } });
        assert_eq!(PRIVATE_IP.string(&doc), Some("10.0.0.4"));
        assert_eq!(PRIVATE_IP.string(&json!({})), None);
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(
            resource_name("/subscriptions/1/resourceGroups/rg1/providers/Microsoft.Network/publicIPAddresses/pip1"),
            Some("pip1")
        );
        assert_eq!(resource_name("pip1"), Some("pip1"));
        assert_eq!(resource_name(".../pip1/"), Some("pip1"));
        assert_eq!(resource_name("/"), None);
    }
}
