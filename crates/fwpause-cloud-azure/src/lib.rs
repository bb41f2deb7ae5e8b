//! Azure binding for fwpause
//!
//! This crate implements the `FirewallApi` and `BlobApi` traits on top of
//! the Azure CLI, so fwpause runs with whatever identity `az` is logged in
//! with (user, service principal or managed identity).
//!
//! # Requirements
//!
//! - `az` must be installed and logged in (`az login`)
//! - The identity needs Network Contributor on the firewall, vnet and route
//!   tables, and Storage Blob Data Contributor when the blob store is used
//!
//! # Example
//!
//! ```ignore
//! use fwpause_cloud::FirewallApi;
//! use fwpause_cloud_azure::AzureProvider;
//!
//! let provider = AzureProvider::new();
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let firewall = provider.show_firewall("rg-hub", "fw-hub").await?;
//! ```

pub mod az;
pub mod error;
pub mod provider;

pub use az::{AccountInfo, AzCli, extract_json_object};
pub use error::{AzureError, FailureKind, Result, classify_failure};
pub use provider::{AzureBlobClient, AzureProvider};
