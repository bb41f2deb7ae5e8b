//! In-memory fakes of the management API traits
//!
//! Enabled with the `test-utils` feature. Both fakes record every call so
//! tests can assert on ordering and on the absence of mutating calls.

use crate::error::{CloudError, Result};
use crate::provider::{AuthStatus, BlobApi, CreateIpConfigRequest, FirewallApi};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// A call received by [`FakeFirewall`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Show {
        resource_group: String,
        firewall_name: String,
    },
    DeleteIpConfiguration {
        name: String,
    },
    CreateIpConfiguration(CreateIpConfigRequest),
    SetRouteNextHop {
        resource_group: String,
        route_table: String,
        route: String,
        next_hop_ip: String,
    },
}

impl ApiCall {
    pub fn is_mutating(&self) -> bool {
        !matches!(self, ApiCall::Show { .. })
    }
}

/// Build a firewall resource document in the `az network firewall show` shape
///
/// Each entry is `(name, private_ip, public_ip_id)`.
pub fn firewall_document(ip_configurations: &[(&str, Option<&str>, &str)]) -> Value {
    let configs: Vec<Value> = ip_configurations
        .iter()
        .map(|(name, private_ip, public_ip_id)| ip_configuration(name, *private_ip, public_ip_id))
        .collect();

    json!({
        "id": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.Network/azureFirewalls/fw1",
        "name": "fw1",
        "provisioningState": "Succeeded",
        "ipConfigurations": configs,
    })
}

/// One IP configuration entry in the `az` output shape
pub fn ip_configuration(name: &str, private_ip: Option<&str>, public_ip_id: &str) -> Value {
    let mut config = json!({
        "name": name,
        "publicIPAddress": { "id": public_ip_id },
        "subnet": {
            "id": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.Network/virtualNetworks/hub/subnets/AzureFirewallSubnet"
        },
    });
    if let Some(ip) = private_ip {
        config["privateIPAddress"] = json!(ip);
    }
    config
}

#[derive(Default)]
struct FirewallState {
    resource: Value,
    scripted: VecDeque<Value>,
    show_error: Option<CloudError>,
    failing_deletes: HashSet<String>,
    failing_routes: HashSet<String>,
    fail_create: bool,
    allocated_ip: Option<String>,
    calls: Vec<ApiCall>,
}

/// Fake firewall management plane
///
/// `show_firewall` serves scripted documents first, then the live document.
/// Deletes and creates mutate the live document immediately.
pub struct FakeFirewall {
    state: Mutex<FirewallState>,
}

impl FakeFirewall {
    pub fn new(resource: Value) -> Self {
        Self {
            state: Mutex::new(FirewallState {
                resource,
                ..Default::default()
            }),
        }
    }

    /// Queue documents returned by the next `show_firewall` calls
    pub fn script(self, documents: impl IntoIterator<Item = Value>) -> Self {
        self.state.lock().unwrap().scripted.extend(documents);
        self
    }

    /// Make the next `show_firewall` call fail
    pub fn fail_show(self, error: CloudError) -> Self {
        self.state.lock().unwrap().show_error = Some(error);
        self
    }

    pub fn fail_delete(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(name.to_string());
        self
    }

    pub fn fail_route(self, route: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_routes
            .insert(route.to_string());
        self
    }

    pub fn fail_create(self) -> Self {
        self.state.lock().unwrap().fail_create = true;
        self
    }

    /// Private IP assigned to configurations created through the fake
    pub fn allocate_ip(self, ip: &str) -> Self {
        self.state.lock().unwrap().allocated_ip = Some(ip.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<ApiCall> {
        self.calls().into_iter().filter(ApiCall::is_mutating).collect()
    }

    pub fn show_count(&self) -> usize {
        self.calls().iter().filter(|c| !c.is_mutating()).count()
    }

    pub fn resource(&self) -> Value {
        self.state.lock().unwrap().resource.clone()
    }
}

#[async_trait]
impl FirewallApi for FakeFirewall {
    fn name(&self) -> &str {
        "fake"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok("fake-account"))
    }

    async fn show_firewall(&self, resource_group: &str, firewall_name: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::Show {
            resource_group: resource_group.to_string(),
            firewall_name: firewall_name.to_string(),
        });
        if let Some(error) = state.show_error.take() {
            return Err(error);
        }
        if let Some(document) = state.scripted.pop_front() {
            return Ok(document);
        }
        Ok(state.resource.clone())
    }

    async fn delete_ip_configuration(
        &self,
        _resource_group: &str,
        _firewall_name: &str,
        name: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::DeleteIpConfiguration {
            name: name.to_string(),
        });
        if state.failing_deletes.contains(name) {
            return Err(CloudError::CommandFailed(format!(
                "failed to delete ip configuration {}",
                name
            )));
        }
        if let Some(configs) = state
            .resource
            .get_mut("ipConfigurations")
            .and_then(Value::as_array_mut)
        {
            configs.retain(|c| c.get("name").and_then(Value::as_str) != Some(name));
        }
        Ok(())
    }

    async fn create_ip_configuration(&self, request: &CreateIpConfigRequest) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(ApiCall::CreateIpConfiguration(request.clone()));
        if state.fail_create {
            return Err(CloudError::CommandFailed(
                "public IP address is already in use".to_string(),
            ));
        }
        let public_ip_id = format!(
            "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/{}/providers/Microsoft.Network/publicIPAddresses/{}",
            request.resource_group, request.public_ip_name
        );
        let config = ip_configuration(
            &request.name,
            state.allocated_ip.as_deref(),
            &public_ip_id,
        );
        match state
            .resource
            .get_mut("ipConfigurations")
            .and_then(Value::as_array_mut)
        {
            Some(configs) => configs.push(config),
            None => state.resource["ipConfigurations"] = json!([config]),
        }
        Ok(())
    }

    async fn set_route_next_hop(
        &self,
        resource_group: &str,
        route_table: &str,
        route: &str,
        next_hop_ip: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ApiCall::SetRouteNextHop {
            resource_group: resource_group.to_string(),
            route_table: route_table.to_string(),
            route: route.to_string(),
            next_hop_ip: next_hop_ip.to_string(),
        });
        if state.failing_routes.contains(route) {
            return Err(CloudError::NotFound(format!("route {}", route)));
        }
        Ok(())
    }
}

/// A call received by [`FakeBlobStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobCall {
    ContainerExists(String),
    CreateContainer(String),
    Get { container: String, blob: String },
    Put { container: String, blob: String },
}

#[derive(Default)]
struct BlobState {
    containers: HashSet<String>,
    blobs: HashMap<(String, String), String>,
    calls: Vec<BlobCall>,
}

/// Fake blob storage account
pub struct FakeBlobStore {
    account: String,
    state: Mutex<BlobState>,
}

impl FakeBlobStore {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            state: Mutex::new(BlobState::default()),
        }
    }

    pub fn with_blob(self, container: &str, blob: &str, content: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.containers.insert(container.to_string());
            state
                .blobs
                .insert((container.to_string(), blob.to_string()), content.to_string());
        }
        self
    }

    pub fn blob(&self, container: &str, blob: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .blobs
            .get(&(container.to_string(), blob.to_string()))
            .cloned()
    }

    pub fn has_container(&self, container: &str) -> bool {
        self.state.lock().unwrap().containers.contains(container)
    }

    pub fn calls(&self) -> Vec<BlobCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl BlobApi for FakeBlobStore {
    fn account(&self) -> &str {
        &self.account
    }

    async fn container_exists(&self, container: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(BlobCall::ContainerExists(container.to_string()));
        Ok(state.containers.contains(container))
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(BlobCall::CreateContainer(container.to_string()));
        state.containers.insert(container.to_string());
        Ok(())
    }

    async fn get_blob(&self, container: &str, blob: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BlobCall::Get {
            container: container.to_string(),
            blob: blob.to_string(),
        });
        Ok(state
            .blobs
            .get(&(container.to_string(), blob.to_string()))
            .cloned())
    }

    async fn put_blob(&self, container: &str, blob: &str, content: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BlobCall::Put {
            container: container.to_string(),
            blob: blob.to_string(),
        });
        if !state.containers.contains(container) {
            return Err(CloudError::NotFound(format!("container {}", container)));
        }
        state
            .blobs
            .insert((container.to_string(), blob.to_string()), content.to_string());
        Ok(())
    }
}
