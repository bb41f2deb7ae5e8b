//! Allocate: recreate the saved IP configuration and wait for a private IP

use crate::error::OpError;
use crate::settings::{FirewallTarget, VnetTarget};
use crate::snapshot::ConfigSnapshot;
use crate::status;
use fwpause_cloud::{CreateIpConfigRequest, FirewallApi, PollOutcome, PollPolicy, poll_until};
use std::time::Duration;

/// 30s settling delay, then every 15s, 300s budget in total
pub const ALLOCATE_POLL: PollPolicy =
    PollPolicy::new(Duration::from_secs(15), Duration::from_secs(300))
        .with_initial_delay(Duration::from_secs(30));

/// Result of a successful allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Restored configuration name
    pub name: String,
    pub public_ip_name: String,
    /// Observed private IP; `None` only in dry-run
    pub private_ip: Option<String>,
    /// Private IP recorded in the snapshot, if any
    pub previous_ip: Option<String>,
    pub waited: Duration,
}

impl Allocation {
    /// The new private IP, only when it differs from a recorded one
    pub fn changed_ip(&self) -> Option<&str> {
        match (self.private_ip.as_deref(), self.previous_ip.as_deref()) {
            (Some(new), Some(old)) if new != old => Some(new),
            _ => None,
        }
    }

    pub fn is_preserved(&self) -> bool {
        matches!(
            (self.private_ip.as_deref(), self.previous_ip.as_deref()),
            (Some(new), Some(old)) if new == old
        )
    }
}

/// Recreate the first saved IP configuration
///
/// Only single-configuration firewalls are restored; further saved entries
/// are reported and skipped. The subnet binding is implied by the vnet, so
/// `vnet.subnet` is not sent to the API.
pub async fn allocate(
    api: &dyn FirewallApi,
    target: &FirewallTarget,
    snapshot: &ConfigSnapshot,
    vnet: &VnetTarget,
    policy: &PollPolicy,
    dry_run: bool,
) -> Result<Allocation, OpError> {
    let entries = snapshot.entries();
    let Some(entry) = entries.first() else {
        return Err(OpError::EmptySnapshot);
    };
    if entries.len() > 1 {
        let skipped: Vec<&str> = entries[1..].iter().map(|e| e.name.as_str()).collect();
        tracing::warn!(
            "Saved configuration has {} IP configurations; only '{}' is restored (skipped: {})",
            entries.len(),
            entry.name,
            skipped.join(", ")
        );
    }

    let public_ip_name = entry
        .public_ip_name()
        .ok_or_else(|| OpError::MissingPublicIp {
            name: entry.name.clone(),
        })?
        .to_string();

    let request = CreateIpConfigRequest {
        resource_group: target.resource_group.clone(),
        firewall_name: target.name.clone(),
        name: entry.name.clone(),
        vnet_name: vnet.name.clone(),
        vnet_resource_group: vnet.resource_group.clone(),
        public_ip_name: public_ip_name.clone(),
    };

    if dry_run {
        tracing::info!(
            "[DRY RUN] would create IP configuration '{}' on {} with vnet {}/{} and public IP '{}'",
            request.name,
            target.name,
            request.vnet_resource_group,
            request.vnet_name,
            request.public_ip_name
        );
        return Ok(Allocation {
            name: request.name,
            public_ip_name,
            private_ip: None,
            previous_ip: entry.private_address.clone(),
            waited: Duration::ZERO,
        });
    }

    tracing::info!(
        "Creating IP configuration '{}' with public IP '{}'",
        request.name,
        request.public_ip_name
    );
    if let Err(source) = api.create_ip_configuration(&request).await {
        return Err(OpError::CreateFailed {
            name: request.name,
            vnet_name: request.vnet_name,
            vnet_resource_group: request.vnet_resource_group,
            public_ip_name,
            source,
        });
    }

    tracing::info!(
        "Waiting for a private IP ({}s settle, every {}s, up to {}s)",
        policy.initial_delay.as_secs(),
        policy.interval.as_secs(),
        policy.max_elapsed.as_secs()
    );
    let outcome = poll_until(policy, |attempt| async move {
        let observation = status::fetch(api, target).await?;
        let private_ip = observation.first_private_ip().map(str::to_string);
        tracing::debug!(
            "Allocation check {} ({}s): private IP {}, provisioning state {}",
            attempt.number,
            attempt.elapsed.as_secs(),
            private_ip.as_deref().unwrap_or("none"),
            observation.provisioning_state.as_deref().unwrap_or("unknown")
        );
        Ok::<_, OpError>(private_ip)
    })
    .await?;

    let attempts = outcome.attempts();
    match outcome {
        PollOutcome::Ready {
            value: private_ip,
            elapsed,
            ..
        } => {
            tracing::info!(
                "Private IP {} assigned after {}s ({} check(s))",
                private_ip,
                elapsed.as_secs(),
                attempts
            );
            Ok(Allocation {
                name: request.name,
                public_ip_name,
                private_ip: Some(private_ip),
                previous_ip: entry.private_address.clone(),
                waited: elapsed,
            })
        }
        PollOutcome::TimedOut { elapsed, .. } => {
            tracing::debug!("No private IP after {} check(s)", attempts);
            Err(OpError::AllocationTimeout {
                waited_secs: elapsed.as_secs(),
            })
        }
    }
}
