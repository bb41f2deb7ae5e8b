//! fwpause cloud abstraction
//!
//! This crate defines the contract fwpause needs from a cloud management
//! plane, independent of how that plane is reached (CLI, REST, SDK).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  fwpause CLI                     │
//! │           (pause / resume / status)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 fwpause-core                     │
//! │   store · status · deallocate · allocate ·       │
//! │   routes · orchestrator                          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                fwpause-cloud                     │
//! │  trait FirewallApi   trait BlobApi   poll_until  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼────────┐
//!           │ azure (az CLI) │
//!           └────────────────┘
//! ```

pub mod error;
pub mod poll;
pub mod provider;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use error::{CloudError, Result};
pub use poll::{PollAttempt, PollOutcome, PollPolicy, poll_until};
pub use provider::{AuthStatus, BlobApi, CreateIpConfigRequest, FirewallApi};
