//! fwpause core
//!
//! Pauses a firewall by saving and then removing its IP configurations, and
//! resumes it by recreating the saved configuration. When the recreated
//! configuration comes back with a different private IP, the listed UDR
//! routes are pointed at the new address.
//!
//! Everything here talks to the management plane through
//! [`fwpause_cloud::FirewallApi`] and [`fwpause_cloud::BlobApi`].

pub mod allocate;
pub mod deallocate;
pub mod error;
pub mod fields;
pub mod orchestrator;
pub mod routes;
pub mod settings;
pub mod snapshot;
pub mod status;
pub mod store;

pub use allocate::{ALLOCATE_POLL, Allocation, allocate};
pub use deallocate::{DEALLOCATE_POLL, DeallocateOutcome, deallocate};
pub use error::{Error, OpError, ReadError, Result, RouteError, StoreError, ValidationError};
pub use orchestrator::{Orchestrator, PauseOutcome, ResumeOutcome, RoutesOutcome, Timings};
pub use routes::{ReconcileReport, RouteOutcome, RouteStatus, RouteUpdateRequest, reconcile};
pub use settings::{Settings, SettingsInput, StorageMode, StorageSettings};
pub use snapshot::{ConfigSnapshot, IpConfigurationSnapshot};
pub use status::{FirewallObservation, FirewallState};
pub use store::{BlobStore, ConfigStore, LocalFileStore};
