//! Deallocate: remove every IP configuration and wait for the count to hit zero

use crate::error::OpError;
use crate::settings::FirewallTarget;
use crate::status;
use fwpause_cloud::{FirewallApi, PollOutcome, PollPolicy, poll_until};
use std::time::Duration;

/// 15s interval, 600s budget
pub const DEALLOCATE_POLL: PollPolicy =
    PollPolicy::new(Duration::from_secs(15), Duration::from_secs(600));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeallocateOutcome {
    /// The firewall already had no IP configurations
    NothingToDo,
    Completed {
        removed: Vec<String>,
        waited: Duration,
    },
    /// Removals were issued but the count never reached zero in time
    TimedOut {
        removed: Vec<String>,
        waited: Duration,
    },
    DryRun {
        would_remove: Vec<String>,
    },
}

impl DeallocateOutcome {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, DeallocateOutcome::TimedOut { .. })
    }
}

/// Remove all IP configurations, one call per configuration
///
/// A removal failure aborts immediately with the names already removed.
/// The poll deadline is not an error: the outcome is `TimedOut` and the
/// caller decides how loudly to report it.
pub async fn deallocate(
    api: &dyn FirewallApi,
    target: &FirewallTarget,
    policy: &PollPolicy,
    dry_run: bool,
) -> Result<DeallocateOutcome, OpError> {
    let observation = status::fetch(api, target).await?;
    let names = observation.configuration_names();
    if names.is_empty() {
        tracing::info!("No IP configurations on {}, nothing to remove", target.name);
        return Ok(DeallocateOutcome::NothingToDo);
    }

    if dry_run {
        for name in &names {
            tracing::info!(
                "[DRY RUN] would remove IP configuration '{}' from {}",
                name,
                target.name
            );
        }
        return Ok(DeallocateOutcome::DryRun {
            would_remove: names,
        });
    }

    let mut removed = Vec::with_capacity(names.len());
    for name in names {
        tracing::info!("Removing IP configuration '{}'", name);
        if let Err(source) = api
            .delete_ip_configuration(&target.resource_group, &target.name, &name)
            .await
        {
            return Err(OpError::RemoveFailed {
                name,
                removed,
                source,
            });
        }
        removed.push(name);
    }

    tracing::info!(
        "Waiting for deallocation (every {}s, up to {}s)",
        policy.interval.as_secs(),
        policy.max_elapsed.as_secs()
    );
    let outcome = poll_until(policy, |attempt| async move {
        let observation = status::fetch(api, target).await?;
        tracing::debug!(
            "Deallocation check {}: {} IP configuration(s), provisioning state {}",
            attempt.number,
            observation.ip_configuration_count,
            observation.provisioning_state.as_deref().unwrap_or("unknown")
        );
        Ok::<_, OpError>((observation.ip_configuration_count == 0).then_some(()))
    })
    .await?;

    let attempts = outcome.attempts();
    match outcome {
        PollOutcome::Ready { elapsed, .. } => {
            tracing::info!(
                "Deallocation complete after {}s ({} check(s))",
                elapsed.as_secs(),
                attempts
            );
            Ok(DeallocateOutcome::Completed {
                removed,
                waited: elapsed,
            })
        }
        PollOutcome::TimedOut { elapsed, .. } => {
            tracing::warn!(
                "IP configurations still present after {}s and {} check(s); deallocation may still be in progress",
                elapsed.as_secs(),
                attempts
            );
            Ok(DeallocateOutcome::TimedOut {
                removed,
                waited: elapsed,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use fwpause_cloud::CloudError;
    use fwpause_cloud::testing::{ApiCall, FakeFirewall, firewall_document};
    use tokio::time::Instant;

    fn target() -> FirewallTarget {
        FirewallTarget {
            resource_group: "rg1".to_string(),
            name: "fw1".to_string(),
        }
    }

    fn two_configs() -> serde_json::Value {
        firewall_document(&[
            ("ipcfg1", Some("10.1.2.4"), "/x/publicIPAddresses/pip1"),
            ("ipcfg2", Some("10.1.2.5"), "/x/publicIPAddresses/pip2"),
        ])
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let api = FakeFirewall::new(firewall_document(&[]));
        let outcome = deallocate(&api, &target(), &DEALLOCATE_POLL, false)
            .await
            .unwrap();
        assert_eq!(outcome, DeallocateOutcome::NothingToDo);
        assert!(api.mutating_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_empty() {
        // Initial read, then N=3 observations still showing a configuration
        let busy = firewall_document(&[("ipcfg1", None, "/x/publicIPAddresses/pip1")]);
        let api = FakeFirewall::new(two_configs()).script([
            two_configs(),
            busy.clone(),
            busy.clone(),
            busy,
        ]);
        let start = Instant::now();

        let outcome = deallocate(&api, &target(), &DEALLOCATE_POLL, false)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DeallocateOutcome::Completed {
                removed: vec!["ipcfg1".to_string(), "ipcfg2".to_string()],
                waited: Duration::from_secs(60),
            }
        );
        // 1 initial read + N+1 poll observations
        assert_eq!(api.show_count(), 1 + 4);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(
            api.mutating_calls(),
            vec![
                ApiCall::DeleteIpConfiguration {
                    name: "ipcfg1".to_string()
                },
                ApiCall::DeleteIpConfiguration {
                    name: "ipcfg2".to_string()
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_not_an_error() {
        let stuck = firewall_document(&[("ipcfg1", None, "/x/publicIPAddresses/pip1")]);
        let api = FakeFirewall::new(two_configs())
            .script(std::iter::once(two_configs()).chain(std::iter::repeat_n(stuck, 40)));
        let start = Instant::now();

        let outcome = deallocate(&api, &target(), &DEALLOCATE_POLL, false)
            .await
            .unwrap();

        assert!(outcome.is_timed_out());
        assert_eq!(api.show_count(), 1 + 40);
        assert_eq!(start.elapsed(), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_partial_removal_failure() {
        let api = FakeFirewall::new(two_configs()).fail_delete("ipcfg2");
        let error = deallocate(&api, &target(), &DEALLOCATE_POLL, false)
            .await
            .unwrap_err();
        match error {
            OpError::RemoveFailed { name, removed, .. } => {
                assert_eq!(name, "ipcfg2");
                assert_eq!(removed, vec!["ipcfg1".to_string()]);
            }
            other => panic!("expected RemoveFailed, got {:?}", other),
        }
        assert_eq!(api.show_count(), 1);
    }

    #[tokio::test]
    async fn test_read_error_is_fatal() {
        let api = FakeFirewall::new(two_configs())
            .fail_show(CloudError::PermissionDenied("AuthorizationFailed".to_string()));
        let error = deallocate(&api, &target(), &DEALLOCATE_POLL, false)
            .await
            .unwrap_err();
        assert!(matches!(error, OpError::Read(ReadError::PermissionDenied { .. })));
        assert!(api.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run() {
        let api = FakeFirewall::new(two_configs());
        let outcome = deallocate(&api, &target(), &DEALLOCATE_POLL, true)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DeallocateOutcome::DryRun {
                would_remove: vec!["ipcfg1".to_string(), "ipcfg2".to_string()],
            }
        );
        assert!(api.mutating_calls().is_empty());
    }
}
