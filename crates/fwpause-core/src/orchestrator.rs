//! pause / resume / status
//!
//! State is always derived from a live observation (zero IP configurations
//! means paused). Nothing about a previous run is trusted.

use crate::allocate::{ALLOCATE_POLL, Allocation, allocate};
use crate::deallocate::{DEALLOCATE_POLL, DeallocateOutcome, deallocate};
use crate::error::Result;
use crate::routes::{ReconcileReport, reconcile};
use crate::settings::{FIREWALL_SUBNET, Settings};
use crate::snapshot::ConfigSnapshot;
use crate::status::{self, FirewallObservation, FirewallState};
use crate::store::ConfigStore;
use fwpause_cloud::{FirewallApi, PollPolicy};

/// Next hop shown when planning route updates in dry-run
pub const DRY_RUN_NEXT_HOP: &str = "<new-private-ip>";

/// Poll policies used by pause and resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub deallocate: PollPolicy,
    pub allocate: PollPolicy,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            deallocate: DEALLOCATE_POLL,
            allocate: ALLOCATE_POLL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PauseOutcome {
    /// No IP configurations; nothing was saved or removed
    AlreadyPaused,
    Paused {
        snapshot: ConfigSnapshot,
        saved_to: String,
        deallocation: DeallocateOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutesOutcome {
    /// Private IP preserved (or nothing to compare against)
    Unchanged,
    /// IP changed but no route list is configured
    NoCsvConfigured { new_ip: String },
    Reconciled(ReconcileReport),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    AlreadyRunning {
        observation: FirewallObservation,
    },
    Resumed {
        allocation: Allocation,
        loaded_from: String,
        routes: RoutesOutcome,
        /// A management IP configuration was saved but is not recreated
        management_not_restored: bool,
    },
}

pub struct Orchestrator<'a> {
    settings: &'a Settings,
    api: &'a dyn FirewallApi,
    store: &'a dyn ConfigStore,
    timings: Timings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(settings: &'a Settings, api: &'a dyn FirewallApi, store: &'a dyn ConfigStore) -> Self {
        Self {
            settings,
            api,
            store,
            timings: Timings::default(),
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Read-only observation; never mutates anything
    pub async fn status(&self) -> Result<FirewallObservation> {
        Ok(status::fetch(self.api, &self.settings.firewall).await?)
    }

    /// Save the live IP configuration, then deallocate
    ///
    /// Deallocation never starts unless the snapshot was persisted.
    pub async fn pause(&self) -> Result<PauseOutcome> {
        let target = &self.settings.firewall;
        let observation = status::fetch(self.api, target).await?;

        let Some(snapshot) = ConfigSnapshot::capture(target, &observation) else {
            tracing::warn!(
                "Firewall {} has no IP configurations; it is already paused",
                target.name
            );
            return Ok(PauseOutcome::AlreadyPaused);
        };

        tracing::info!(
            "Saving {} IP configuration(s) of {} to {}",
            snapshot.ip_configurations.len(),
            target.name,
            self.store.location()
        );
        self.store.save(&snapshot).await?;

        let deallocation = deallocate(
            self.api,
            target,
            &self.timings.deallocate,
            self.settings.dry_run,
        )
        .await?;

        Ok(PauseOutcome::Paused {
            snapshot,
            saved_to: self.store.location(),
            deallocation,
        })
    }

    /// Recreate the saved IP configuration and repair routes if the IP moved
    pub async fn resume(&self) -> Result<ResumeOutcome> {
        let target = &self.settings.firewall;
        let observation = status::fetch(self.api, target).await?;
        if observation.state() == FirewallState::Running {
            tracing::warn!(
                "Firewall {} already has {} IP configuration(s); it is already running",
                target.name,
                observation.ip_configuration_count
            );
            return Ok(ResumeOutcome::AlreadyRunning { observation });
        }

        let snapshot = self.store.load().await?;
        if !self.settings.vnet.uses_firewall_subnet() {
            tracing::warn!(
                "--subnet '{}' is ignored: Azure binds firewall IP configurations to {}",
                self.settings.vnet.subnet,
                FIREWALL_SUBNET
            );
        }

        let allocation = allocate(
            self.api,
            target,
            &snapshot,
            &self.settings.vnet,
            &self.timings.allocate,
            self.settings.dry_run,
        )
        .await?;

        let routes = self.reconcile_routes(&allocation).await?;

        let management_not_restored = snapshot.has_management_configuration();
        if management_not_restored {
            tracing::warn!(
                "A management IP configuration was saved but is not restored; forced-tunnelling firewalls need it recreated manually"
            );
        }

        Ok(ResumeOutcome::Resumed {
            allocation,
            loaded_from: self.store.location(),
            routes,
            management_not_restored,
        })
    }

    async fn reconcile_routes(&self, allocation: &Allocation) -> Result<RoutesOutcome> {
        let next_hop = match allocation.changed_ip() {
            Some(ip) => ip.to_string(),
            // dry-run has no observed IP; plan against a placeholder
            None if self.settings.dry_run && self.settings.udr_csv.is_some() => {
                DRY_RUN_NEXT_HOP.to_string()
            }
            None => {
                if allocation.is_preserved() {
                    tracing::info!("Private IP preserved; routes need no update");
                }
                return Ok(RoutesOutcome::Unchanged);
            }
        };

        let Some(csv_path) = self.settings.udr_csv.as_deref() else {
            tracing::warn!(
                "Private IP changed to {} and no --udr-csv was given; routes may need manual correction",
                next_hop
            );
            return Ok(RoutesOutcome::NoCsvConfigured { new_ip: next_hop });
        };

        let report = reconcile(self.api, csv_path, &next_hop, self.settings.dry_run).await?;
        if !report.is_clean() {
            tracing::warn!(
                "{} of {} route update(s) failed",
                report.failed(),
                report.outcomes.len()
            );
        }
        Ok(RoutesOutcome::Reconciled(report))
    }
}
